// Demo route tree, declared in code
//
//   _app.tsx               document shell
//   _layout.tsx            site navigation
//   _middleware.ts         visitor + response timing
//   _error.tsx             site-wide error page
//   index.tsx, about.tsx
//   blog/index.tsx, blog/[slug].tsx, blog/broken.tsx, blog/_error.tsx
//   docs/[...path].tsx
//   admin/_middleware.ts   header-based guard
//   admin/index.tsx
//   embed/widget.tsx       rendered without the document shell
//   api/echo.ts            JSON, GET + POST only

use maud::{html, DOCTYPE};
use serde_json::json;
use std::time::Instant;
use trellis::{
    component, handler, middleware, Exports, Method, ModuleRegistry, Outcome, Response,
    RouteConfig, StatusCode,
};

pub fn registry() -> ModuleRegistry {
    ModuleRegistry::new()
        .with_module("_app.tsx", app_shell())
        .with_module("_layout.tsx", site_layout())
        .with_module("_middleware.ts", timing())
        .with_module("_error.tsx", site_error())
        .with_module("index.tsx", home())
        .with_module("about.tsx", about())
        .with_module("blog/index.tsx", blog_index())
        .with_module("blog/[slug].tsx", blog_post())
        .with_module("blog/broken.tsx", broken_post())
        .with_module("blog/_error.tsx", blog_error())
        .with_module("docs/[...path].tsx", docs())
        .with_module("admin/_middleware.ts", admin_guard())
        .with_module("admin/index.tsx", admin_home())
        .with_module("embed/widget.tsx", widget())
        .with_module("api/echo.ts", echo())
}

fn app_shell() -> Exports {
    Exports::new().with_component(component(|props| {
        Ok(html! {
            (DOCTYPE)
            html lang="en" {
                head {
                    meta charset="UTF-8";
                    title { "Trellis" }
                }
                body { (props.children()) }
            }
        })
    }))
}

fn site_layout() -> Exports {
    Exports::new().with_component(component(|props| {
        Ok(html! {
            nav {
                a href="/" { "Home" } " "
                a href="/blog" { "Blog" } " "
                a href="/docs" { "Docs" } " "
                a href="/about" { "About" }
            }
            main { (props.children()) }
        })
    }))
}

/// Records the visitor in request state and times the rest of the chain
fn timing() -> Exports {
    Exports::new().with_middleware(middleware(|ctx, next| {
        Box::pin(async move {
            let visitor = ctx.get_header("x-user").unwrap_or("guest").to_string();
            ctx.state.insert("visitor", visitor);

            let started = Instant::now();
            let response = next.run(&mut *ctx).await?;
            let elapsed = started.elapsed().as_micros();

            Ok(response.header("x-response-time", format!("{elapsed}us")))
        })
    }))
}

fn site_error() -> Exports {
    Exports::new().with_component(component(|props| {
        Ok(html! {
            h1 { "Something went wrong" }
            p.error { (props.ctx.error_message().unwrap_or_default()) }
        })
    }))
}

fn home() -> Exports {
    Exports::new().with_component(component(|props| {
        let visitor = props.ctx.state.get_str("visitor").unwrap_or("guest");
        Ok(html! {
            h1 { "Welcome to Trellis" }
            p { "Hello, " (visitor) "." }
        })
    }))
}

fn about() -> Exports {
    Exports::new().with_component(component(|_props| {
        Ok(html! {
            h1 { "About" }
            p { "Routes, layouts, middleware and error boundaries from a directory tree." }
        })
    }))
}

fn blog_index() -> Exports {
    Exports::new().with_component(component(|_props| {
        Ok(html! {
            h1 { "Blog" }
            ul {
                li { a href="/blog/hello-world" { "Hello, world" } }
                li { a href="/blog/broken" { "A broken post" } }
            }
        })
    }))
}

fn blog_post() -> Exports {
    Exports::new()
        .with_handler(handler(|ctx| {
            Box::pin(async move {
                let slug = ctx.param("slug").unwrap_or_default();
                let title = slug.replace('-', " ");
                Ok(Outcome::render_with(json!({ "slug": slug, "title": title })))
            })
        }))
        .with_component(component(|props| {
            let data = props.data().cloned().unwrap_or_default();
            Ok(html! {
                article {
                    h1 { (data["title"].as_str().unwrap_or_default()) }
                    p { "slug: " code { (data["slug"].as_str().unwrap_or_default()) } }
                }
            })
        }))
}

fn broken_post() -> Exports {
    Exports::new().with_handler(handler(|_ctx| {
        Box::pin(async { Err(anyhow::anyhow!("this post failed to load")) })
    }))
}

fn blog_error() -> Exports {
    Exports::new().with_component(component(|props| {
        Ok(html! {
            h1 { "Blog error" }
            p.error { (props.ctx.error_message().unwrap_or_default()) }
            a href="/blog" { "Back to the blog" }
        })
    }))
}

fn docs() -> Exports {
    Exports::new().with_component(component(|props| {
        let path = props.ctx.params.get_all("path").unwrap_or_default();
        Ok(html! {
            h1 { "Docs" }
            @if path.is_empty() {
                p { "Pick a topic." }
            } @else {
                ol.breadcrumbs {
                    @for part in path { li { (part) } }
                }
            }
        })
    }))
}

fn admin_guard() -> Exports {
    Exports::new().with_middleware(middleware(|ctx, next| {
        Box::pin(async move {
            if ctx.get_header("x-admin") != Some("1") {
                return Ok(Response::new(StatusCode::UNAUTHORIZED)
                    .header("content-type", "text/plain; charset=utf-8")
                    .body("admin only"));
            }
            ctx.state.insert("admin", true);
            next.run(ctx).await
        })
    }))
}

fn admin_home() -> Exports {
    Exports::new().with_component(component(|props| {
        let visitor = props.ctx.state.get_str("visitor").unwrap_or("guest");
        Ok(html! {
            h1 { "Admin" }
            p { "Signed in as " (visitor) }
        })
    }))
}

fn widget() -> Exports {
    Exports::new()
        .with_config(RouteConfig::skip_app_wrapper())
        .with_component(component(|_props| Ok(html! { div.widget { "widget" } })))
}

fn echo() -> Exports {
    Exports::new()
        .with_method(
            Method::GET,
            handler(|ctx| {
                Box::pin(async move {
                    let body = json!({ "route": ctx.route, "query": ctx.query.as_map() });
                    Ok(Response::json(&body).into())
                })
            }),
        )
        .with_method(
            Method::POST,
            handler(|ctx| {
                Box::pin(async move {
                    let payload: serde_json::Value = ctx.json()?;
                    Ok(Response::json(&json!({ "echo": payload }))
                        .status(StatusCode::CREATED)
                        .into())
                })
            }),
        )
}
