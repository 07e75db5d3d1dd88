use base::error::Error;
use base::views::{RenderOutcome, View, ViewEngine};
use serde_json::json;
use std::fs;
use tempfile::TempDir;

fn engine(files: &[(&str, &str)]) -> (TempDir, ViewEngine) {
    let dir = TempDir::new().unwrap();
    for (name, content) in files {
        let path = dir.path().join(format!("{}.html", name));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    let engine = ViewEngine::new(dir.path());
    (dir, engine)
}

fn body(outcome: RenderOutcome) -> String {
    match outcome {
        RenderOutcome::Rendered { body, .. } => body,
        RenderOutcome::Failed(failure) => panic!("render failed: {}", failure),
    }
}

#[test]
fn test_blog_page_with_layout_partial_and_sections() {
    let (_dir, engine) = engine(&[
        (
            "layouts/main",
            "<title>@{section('title')}Blog@{close}</title>\
             <nav>@{partial('shared/nav')}</nav>\
             <main>@{show('content')}</main>",
        ),
        ("shared/nav", "@{if user}Hi @{user.name}@{else}Log in@{fi}"),
        (
            "posts/index",
            "@{extend('layouts/main')}\
             @{section('title')}Posts | @parent@{close}\
             @{section('content')}<ul>@{foreach post in posts}<li>@{index}. @{post.title}</li>@{end}</ul>@{close}",
        ),
    ]);

    let view = View::make(
        "posts/index",
        json!({
            "user": {"name": "Ana"},
            "posts": [{"title": "First"}, {"title": "Fish & Chips"}]
        }),
    );

    assert_eq!(
        body(view.render(&engine)),
        "<title>Posts | Blog</title><nav>Hi Ana</nav>\
         <main><ul><li>0. First</li><li>1. Fish &amp; Chips</li></ul></main>"
    );
}

#[test]
fn test_layout_default_used_when_child_does_not_fill_section() {
    let (_dir, engine) = engine(&[
        ("base", "[@{section('sidebar')}default@{close}|@{show('content')}]"),
        ("page", "@{extend('base')}@{section('content')}body@{close}"),
    ]);

    assert_eq!(body(View::new("page").render(&engine)), "[default|body]");
}

#[test]
fn test_two_level_extend_chain() {
    let (_dir, engine) = engine(&[
        ("root", "<html>@{show('body')}</html>"),
        (
            "two_column",
            "@{extend('root')}@{section('body')}<aside>@{show('side')}</aside>@{show('main')}@{close}",
        ),
        (
            "article",
            "@{extend('two_column')}@{section('side')}links@{close}@{section('main')}text@{close}",
        ),
    ]);

    assert_eq!(
        body(View::new("article").render(&engine)),
        "<html><aside>links</aside>text</html>"
    );
}

#[test]
fn test_status_is_carried_to_the_outcome() {
    let (_dir, engine) = engine(&[("error/404", "Nothing at @{path}")]);

    match View::new("error/404").with("path", "/x").with_status(404).render(&engine) {
        RenderOutcome::Rendered { status, body } => {
            assert_eq!(status, Some(404));
            assert_eq!(body, "Nothing at /x");
        }
        RenderOutcome::Failed(failure) => panic!("render failed: {}", failure),
    }
}

#[test]
fn test_nested_sections_are_rejected() {
    let (_dir, engine) = engine(&[(
        "nested",
        "@{section('a')}@{section('b')}x@{close}@{close}",
    )]);

    match View::new("nested").render(&engine) {
        RenderOutcome::Failed(failure) => {
            assert_eq!(failure.template, "nested");
            assert!(matches!(failure.error, Error::TemplateState(_)));
        }
        RenderOutcome::Rendered { body, .. } => panic!("expected failure, got {}", body),
    }
}

#[test]
fn test_parse_errors_name_the_template() {
    let (_dir, engine) = engine(&[("broken", "@{if ok}never closed")]);

    match View::new("broken").render(&engine) {
        RenderOutcome::Failed(failure) => {
            assert_eq!(failure.template, "broken");
            assert!(failure.to_string().contains("broken"));
        }
        RenderOutcome::Rendered { body, .. } => panic!("expected failure, got {}", body),
    }
}
