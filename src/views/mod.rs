//! Template views with layout inheritance
//!
//! Templates use the `@{...}` directive syntax:
//!
//! ```text
//! @{extend('layouts/main')}
//! @{section('content')}
//!   <h1>@{title}</h1>
//!   @{foreach post in posts}<li>@{index}: @{post.title}</li>@{end}
//!   @{partial('shared/footer')}
//! @{close}
//! ```
//!
//! and the layout shows the sections the child filled:
//!
//! ```text
//! <body>@{show('content')}</body>
//! ```

pub mod ast;
pub mod engine;
pub mod lexer;
pub mod parser;
pub mod renderer;
pub mod view;

pub use engine::ViewEngine;
pub use view::{RenderFailure, RenderOutcome, View};
