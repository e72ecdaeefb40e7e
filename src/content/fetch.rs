use crate::content::{load_content, LoadedContent};
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::thread;

/// One completed fetch, tagged with the generation that requested it.
/// The controller discards replies whose generation no longer matches
/// its current one, so a refresh-during-flight or teardown never
/// applies stale data to the view.
pub struct FetchReply {
    pub generation: u64,
    pub result: Result<LoadedContent, String>,
}

/// Run a content load on a worker thread and deliver the reply over
/// the channel. The render loop stays free to paint while the load is
/// in flight. Errors cross the thread boundary as display strings;
/// the controller turns them into UI state rather than propagating.
pub fn spawn_fetch(tx: Sender<FetchReply>, generation: u64, primary: PathBuf, snapshot: PathBuf) {
    thread::spawn(move || {
        let result = load_content(&primary, &snapshot).map_err(|e| format!("{e:#}"));
        // Send failure means the controller is gone; nothing to do
        let _ = tx.send(FetchReply { generation, result });
    });
}
