//! View command handler.

use color_eyre::Result;

use crate::feed;
use crate::viewer::run_viewer;

use super::App;

impl App {
    /// Open the viewer window, fed by a background state feed.
    ///
    /// Blocks the calling thread until the window closes; the feed keeps
    /// running on the runtime's worker threads meanwhile.
    pub async fn run_view(&self) -> Result<()> {
        let ctx = self.context()?;
        let (feed, handle, events) = feed::channel(ctx.api.clone(), &ctx.config.feed);
        let task = tokio::spawn(feed.run());

        tracing::info!("Opening viewer");
        run_viewer(&ctx.config.visualizer, events, handle);

        task.abort();
        tracing::info!("Viewer closed");
        Ok(())
    }
}
