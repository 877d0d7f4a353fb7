#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;
use signalrouter::middleware::Step;

/// Shared log of step names, in the order the steps ran.
#[derive(Clone, Default)]
pub struct Recorder(Arc<Mutex<Vec<String>>>);

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, name: &str) {
        self.0.lock().push(name.to_owned());
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    /// Chaining step that records `name` and advances.
    pub fn pass(&self, name: &str) -> Step {
        let rec = self.clone();
        let name = name.to_owned();
        Step::chain(move |ctx, next| {
            rec.push(&name);
            next.run(ctx)
        })
    }

    /// Terminal step that records `name` and commits `status` with a text body.
    pub fn respond(&self, name: &str, status: u16) -> Step {
        let rec = self.clone();
        let name = name.to_owned();
        Step::terminal(move |ctx| {
            rec.push(&name);
            ctx.res.status(status).text(name.clone())?;
            Ok(())
        })
    }

    /// Terminal step that records `name` and commits nothing.
    pub fn quiet(&self, name: &str) -> Step {
        let rec = self.clone();
        let name = name.to_owned();
        Step::terminal(move |_| {
            rec.push(&name);
            Ok(())
        })
    }
}

/// Terminal handler committing `body` as plain text.
pub fn text(body: &'static str) -> Step {
    Step::terminal(move |ctx| {
        ctx.res.text(body)?;
        Ok(())
    })
}

pub mod temp_files {
    use std::io::Write;

    use tempfile::NamedTempFile;

    /// Write `content` to a temp file with the given extension. The file is
    /// removed when the handle drops.
    pub fn create_temp_table(content: &str, ext: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .prefix("signal_routes_")
            .suffix(&format!(".{ext}"))
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }
}
