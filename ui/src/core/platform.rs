//! Platform glue for the report views.

/// Run a fire-and-forget future. Plot loads go through here so each task
/// owns its own target element and a late completion is a safe no-op.
#[cfg(target_arch = "wasm32")]
pub fn spawn_future<F>(future: F)
where
    F: std::future::Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(future);
}

#[cfg(not(target_arch = "wasm32"))]
pub fn spawn_future<F>(future: F)
where
    F: std::future::Future<Output = ()> + 'static,
{
    // Off-wasm there is no browser event loop to hand the task to.
    futures::executor::block_on(future);
}
