//! Native window for the page host.
//!
//! When compiled with the `webview` feature, opens a winit window with a wry
//! webview filling it and drives a [`PageHost`] from the webview's
//! navigation and load events. Without the feature, [`ShellWindow::run`]
//! returns an error and the binary falls back to headless mode.
//!
//! Links between pages are intercepted before the webview follows them and
//! turned into host navigations, so pages always come from the embedded
//! catalog rather than from disk. Update prompts arriving on the
//! [`PromptRequests`] channel are shown as dialogs once a page has loaded.

use schoolhouse_core::config::ShellConfig;
use url::Url;

use crate::error::ShellError;
use crate::host::page_name_from_url;
use crate::pages::PageCatalog;
use crate::prompt::PromptRequests;

pub struct ShellWindow {
    config: ShellConfig,
    catalog: PageCatalog,
    prompts: Option<PromptRequests>,
}

impl ShellWindow {
    pub fn new(config: ShellConfig) -> Self {
        Self {
            config,
            catalog: PageCatalog::embedded(),
            prompts: None,
        }
    }

    /// Serve update prompts from this channel while the window is open.
    pub fn with_prompts(mut self, prompts: PromptRequests) -> Self {
        self.prompts = Some(prompts);
        self
    }

    /// Whether this build can open a window at all.
    pub fn is_supported() -> bool {
        cfg!(feature = "webview")
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    /// Open the window and block until it is closed. Must be called on the
    /// main thread.
    #[cfg(feature = "webview")]
    pub fn run(self) -> Result<(), ShellError> {
        native::run(self)
    }

    #[cfg(not(feature = "webview"))]
    pub fn run(self) -> Result<(), ShellError> {
        tracing::warn!("Webview support not compiled in; rebuild with --features webview");
        Err(ShellError::Window(
            "webview feature not enabled".to_string(),
        ))
    }
}

/// Whether a navigation targets a local page the host should serve. Remote
/// URLs and documents without a page name are left to the webview.
pub fn is_local_navigation(url: &str) -> bool {
    let local = match Url::parse(url) {
        Ok(parsed) => parsed.scheme() == "file",
        Err(_) => true,
    };
    local && page_name_from_url(url).is_some()
}

#[cfg(feature = "webview")]
mod native {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use winit::application::ApplicationHandler;
    use winit::dpi::LogicalSize;
    use winit::event::WindowEvent;
    use winit::event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy};
    use winit::window::{Window, WindowId};
    use wry::{PageLoadEvent, WebView, WebViewBuilder};

    use super::{is_local_navigation, ShellWindow};
    use crate::error::ShellError;
    use crate::host::{inject_base_href, page_name_from_url, PageHost, PageLoad, RenderSurface};
    use crate::prompt::PromptRequest;

    #[derive(Debug)]
    enum ShellEvent {
        Navigate(String),
        PageReady,
        Prompt(PromptRequest),
    }

    struct WebViewSurface {
        webview: WebView,
    }

    impl WebViewSurface {
        /// Open the dialog in the current document. The answer is sent when
        /// the user closes it; if the script cannot run, the reply is dropped
        /// and the asking side sees the window as gone.
        fn show_dialog(&self, request: PromptRequest) {
            let PromptRequest { dialog, reply } = request;
            let script = dialog.script();
            let reply = Mutex::new(Some(reply));
            let result = self.webview.evaluate_script_with_callback(&script, move |raw| {
                let pending = reply.lock().ok().and_then(|mut slot| slot.take());
                if let Some(reply) = pending {
                    let _ = reply.send(dialog.answer(&raw));
                }
            });
            if let Err(e) = result {
                tracing::warn!(error = %e, "Failed to show dialog");
            }
        }
    }

    impl RenderSurface for WebViewSurface {
        fn set_html(&mut self, html: &str, base_url: Option<&str>) -> Result<(), ShellError> {
            let document = match base_url {
                Some(base) => inject_base_href(html, base),
                None => html.to_string(),
            };
            self.webview
                .load_html(&document)
                .map_err(|e| ShellError::Surface(e.to_string()))
        }

        fn set_zoom(&mut self, factor: f64) -> Result<(), ShellError> {
            self.webview
                .zoom(factor)
                .map_err(|e| ShellError::Surface(e.to_string()))
        }
    }

    struct ShellApp {
        shell: ShellWindow,
        proxy: EventLoopProxy<ShellEvent>,
        window: Option<Window>,
        host: Option<PageHost<WebViewSurface>>,
        page_ready: bool,
        pending_prompts: VecDeque<PromptRequest>,
        error: Option<ShellError>,
    }

    impl ShellApp {
        fn open(&mut self, event_loop: &ActiveEventLoop) -> Result<(), ShellError> {
            let config = &self.shell.config;
            let attributes = Window::default_attributes()
                .with_title(config.title.clone())
                .with_inner_size(LogicalSize::new(config.width, config.height))
                .with_maximized(config.maximized);
            let window = event_loop
                .create_window(attributes)
                .map_err(|e| ShellError::Window(e.to_string()))?;

            let nav_proxy = self.proxy.clone();
            let load_proxy = self.proxy.clone();
            let catalog = self.shell.catalog.clone();
            let webview = WebViewBuilder::new()
                .with_devtools(config.devtools)
                .with_navigation_handler(move |url: String| {
                    let known = page_name_from_url(&url).is_some_and(|name| catalog.contains(&name));
                    if !known || !is_local_navigation(&url) {
                        return true;
                    }
                    if nav_proxy.send_event(ShellEvent::Navigate(url)).is_err() {
                        tracing::debug!("Event loop closed, dropping navigation");
                    }
                    false
                })
                .with_on_page_load_handler(move |event, _url| {
                    if matches!(event, PageLoadEvent::Finished)
                        && load_proxy.send_event(ShellEvent::PageReady).is_err()
                    {
                        tracing::debug!("Event loop closed, dropping page ready");
                    }
                })
                .build(&window)
                .map_err(|e| ShellError::Window(format!("Failed to create webview: {}", e)))?;

            let mut host = PageHost::from_config(
                config,
                self.shell.catalog.clone(),
                WebViewSurface { webview },
            );
            host.load_page(&config.initial_page);

            tracing::info!(
                title = %config.title,
                page = %config.initial_page,
                "Window opened"
            );
            self.window = Some(window);
            self.host = Some(host);
            Ok(())
        }

        fn show_prompt(&mut self, request: PromptRequest) {
            match self.host.as_ref() {
                Some(host) if self.page_ready => host.surface().show_dialog(request),
                _ => self.pending_prompts.push_back(request),
            }
        }
    }

    impl ApplicationHandler<ShellEvent> for ShellApp {
        fn resumed(&mut self, event_loop: &ActiveEventLoop) {
            if self.window.is_some() {
                return;
            }
            if let Err(e) = self.open(event_loop) {
                tracing::error!(error = %e, "Failed to open window");
                self.error = Some(e);
                event_loop.exit();
            }
        }

        fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
            if let WindowEvent::CloseRequested = event {
                tracing::info!("Window closed");
                // Unanswered prompts are dropped, which declines them.
                self.pending_prompts.clear();
                self.host = None;
                self.window = None;
                event_loop.exit();
            }
        }

        fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: ShellEvent) {
            match event {
                ShellEvent::Prompt(request) => self.show_prompt(request),
                ShellEvent::Navigate(url) => {
                    let Some(host) = self.host.as_mut() else {
                        return;
                    };
                    if matches!(
                        host.on_navigated(&url),
                        Some(PageLoad::Loaded(_) | PageLoad::NotFound(_))
                    ) {
                        self.page_ready = false;
                    }
                }
                ShellEvent::PageReady => {
                    let Some(host) = self.host.as_mut() else {
                        return;
                    };
                    if let Err(e) = host.on_page_ready() {
                        tracing::warn!(error = %e, "Failed to reapply zoom");
                    }
                    self.page_ready = true;
                    while let Some(request) = self.pending_prompts.pop_front() {
                        self.show_prompt(request);
                    }
                }
            }
        }
    }

    pub(super) fn run(mut shell: ShellWindow) -> Result<(), ShellError> {
        let event_loop = EventLoop::<ShellEvent>::with_user_event()
            .build()
            .map_err(|e| ShellError::Window(e.to_string()))?;

        if let Some(mut prompts) = shell.prompts.take() {
            let proxy = event_loop.create_proxy();
            std::thread::Builder::new()
                .name("schoolhouse-prompts".to_string())
                .spawn(move || {
                    while let Some(request) = prompts.blocking_recv() {
                        if proxy.send_event(ShellEvent::Prompt(request)).is_err() {
                            tracing::debug!("Event loop closed, prompt declined");
                            break;
                        }
                    }
                })
                .map_err(|e| ShellError::Window(format!("prompt thread: {}", e)))?;
        }

        let mut app = ShellApp {
            shell,
            proxy: event_loop.create_proxy(),
            window: None,
            host: None,
            page_ready: false,
            pending_prompts: VecDeque::new(),
            error: None,
        };
        event_loop
            .run_app(&mut app)
            .map_err(|e| ShellError::Window(e.to_string()))?;
        match app.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
