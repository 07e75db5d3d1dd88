//! Controller and action naming conventions
//!
//! `blog/` + `posts` becomes `BlogPostsController`; action `show` becomes
//! `actionShow`, or `getShow`/`postShow`/... for RESTful controllers.

/// Upper-case the first letter of every `-`/`_` separated word and drop the separators
pub fn pascal_case(input: &str) -> String {
    input
        .split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(ucfirst)
        .collect()
}

fn ucfirst(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Directory names are concatenated without separators before casing
pub fn format_controller(directories: &[String], controller: &str) -> String {
    let directory: String = directories.concat();
    format!("{}{}Controller", pascal_case(&directory), pascal_case(controller))
}

pub fn format_action(action: &str, restful: bool, method: &str) -> String {
    let prefix = if restful {
        method.to_lowercase()
    } else {
        "action".to_string()
    };
    format!("{}{}", prefix, pascal_case(action))
}
