use base::routing::{format_action, format_controller, ControllerLayout, RouteResolver};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::collections::HashSet;

struct Layout {
    directories: HashSet<&'static str>,
    controllers: HashSet<&'static str>,
}

impl Layout {
    fn new() -> Self {
        Self {
            directories: ["admin", "blog", "blog/archive"].into_iter().collect(),
            controllers: [
                "index",
                "users",
                "admin/users",
                "blog/posts",
                "blog/archive/years",
            ]
            .into_iter()
            .collect(),
        }
    }
}

impl ControllerLayout for Layout {
    fn is_directory(&self, path: &str) -> bool {
        self.directories.contains(path)
    }

    fn has_controller(&self, directory: &str, name: &str) -> bool {
        let key = if directory.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", directory, name)
        };
        self.controllers.contains(key.as_str())
    }
}

fn benchmark_resolve(c: &mut Criterion) {
    let layout = Layout::new();
    let resolver = RouteResolver::default();

    c.bench_function("resolve_root", |b| {
        b.iter(|| black_box(resolver.resolve("GET", black_box("/"), &layout)))
    });

    c.bench_function("resolve_nested", |b| {
        b.iter(|| {
            black_box(resolver.resolve("GET", black_box("/blog/posts/show/42"), &layout))
        })
    });

    c.bench_function("resolve_deep_with_params", |b| {
        b.iter(|| {
            black_box(resolver.resolve(
                "GET",
                black_box("/blog/archive/years/list/2024/03/page/2"),
                &layout,
            ))
        })
    });

    let mounted = RouteResolver::new("/app");
    c.bench_function("resolve_with_base_path", |b| {
        b.iter(|| black_box(mounted.resolve("POST", black_box("/app/admin/users/edit/7"), &layout)))
    });
}

fn benchmark_naming(c: &mut Criterion) {
    let directories = vec!["blog".to_string(), "archive".to_string()];

    c.bench_function("format_controller", |b| {
        b.iter(|| black_box(format_controller(black_box(&directories), "post-years")))
    });

    c.bench_function("format_action_restful", |b| {
        b.iter(|| black_box(format_action(black_box("create_draft"), true, "POST")))
    });
}

criterion_group!(benches, benchmark_resolve, benchmark_naming);
criterion_main!(benches);
