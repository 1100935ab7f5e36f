//! Schoolhouse shell: the embedded school pages and the host that shows them.
//!
//! Pages are compiled into the binary with `include_str!` and rendered into
//! a [`RenderSurface`]. The native window lives in [`window`] and is only
//! functional with the `webview` feature.
//!
//! # Modules
//!
//! - [`pages`]: the embedded page catalog and the not-found page
//! - [`host`]: navigation, zoom and the surface seam
//! - [`prompt`]: update dialogs shown inside the window
//! - [`window`]: wry + winit window driving a [`PageHost`]

pub mod error;
pub mod host;
pub mod pages;
pub mod prompt;
pub mod window;

pub use error::ShellError;
pub use host::{inject_base_href, page_name_from_url, PageHost, PageLoad, RenderSurface};
pub use pages::{PageCatalog, NOT_FOUND_HTML};
pub use prompt::{Dialog, PromptRequest, PromptRequests, WindowPrompt};
pub use window::ShellWindow;
