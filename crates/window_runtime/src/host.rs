//! Browser page wiring: viewport queries and page lifecycle listeners.
//!
//! Listeners hold a weak runtime reference and are leaked for the page lifetime. Native builds
//! compile to no-ops.

use std::{cell::RefCell, rc::Weak};

use leptos::logging;

use crate::{
    model::Viewport,
    runtime::{DesktopRuntime, DesktopServices, PageEvent, SharedDesktop},
};

/// Current browser viewport size, or `None` outside a browser.
pub fn current_viewport() -> Option<Viewport> {
    #[cfg(target_arch = "wasm32")]
    {
        let window = web_sys::window()?;
        let width = window.inner_width().ok()?.as_f64()?;
        let height = window.inner_height().ok()?.as_f64()?;
        Some(Viewport {
            width: width.round() as i32,
            height: height.round() as i32,
        })
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        None
    }
}

/// Builds the browser runtime, registers the built-in windows, and installs page hooks.
///
/// Saved layout is restored separately through [`DesktopRuntime::restore_layout`] once the
/// visual layer has mounted window surfaces.
pub fn boot_desktop() -> SharedDesktop {
    let desktop = DesktopRuntime::new(DesktopServices::default());
    {
        let mut runtime = desktop.borrow_mut();
        let registered = runtime.register_builtin_windows();
        if let Some(viewport) = current_viewport() {
            runtime.set_viewport(viewport);
        }
        logging::log!(
            "desktop runtime booted with {registered} windows on {} host",
            runtime.services().host_strategy_name()
        );
    }
    install_page_lifecycle_hooks(&desktop);
    desktop
}

#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
fn dispatch_page_event(target: &Weak<RefCell<DesktopRuntime>>, event: PageEvent) {
    let Some(desktop) = target.upgrade() else {
        return;
    };
    match desktop.try_borrow_mut() {
        Ok(mut runtime) => {
            runtime.handle_page_event(event);
        }
        Err(_) => logging::warn!("page event {event:?} dropped: runtime is busy"),
    };
}

#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
fn sync_viewport(target: &Weak<RefCell<DesktopRuntime>>) {
    let (Some(desktop), Some(viewport)) = (target.upgrade(), current_viewport()) else {
        return;
    };
    if let Ok(mut runtime) = desktop.try_borrow_mut() {
        runtime.set_viewport(viewport);
    };
}

/// Saves immediately on `blur`, `pagehide`, `beforeunload`, and `visibilitychange` to hidden,
/// and tracks `resize`. Returns `false` when there is no browser window.
pub fn install_page_lifecycle_hooks(desktop: &SharedDesktop) -> bool {
    #[cfg(target_arch = "wasm32")]
    {
        use std::rc::Rc;

        use wasm_bindgen::{closure::Closure, JsCast};

        let Some(window) = web_sys::window() else {
            return false;
        };
        let Some(document) = window.document() else {
            return false;
        };

        let listen = |target: &web_sys::EventTarget, name: &str, callback: Closure<dyn FnMut()>| {
            if let Err(err) =
                target.add_event_listener_with_callback(name, callback.as_ref().unchecked_ref())
            {
                logging::warn!("failed to install `{name}` listener: {err:?}");
            }
            callback.forget();
        };

        for (name, event) in [
            ("blur", PageEvent::Blur),
            ("pagehide", PageEvent::Teardown),
            ("beforeunload", PageEvent::Teardown),
        ] {
            let target = Rc::downgrade(desktop);
            listen(
                &window,
                name,
                Closure::new(move || dispatch_page_event(&target, event)),
            );
        }

        let target = Rc::downgrade(desktop);
        let visibility_document = document.clone();
        listen(
            &document,
            "visibilitychange",
            Closure::new(move || {
                if visibility_document.visibility_state() == web_sys::VisibilityState::Hidden {
                    dispatch_page_event(&target, PageEvent::Hidden);
                }
            }),
        );

        let target = Rc::downgrade(desktop);
        listen(&window, "resize", Closure::new(move || sync_viewport(&target)));
        true
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = desktop;
        false
    }
}
