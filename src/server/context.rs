use super::request::Request;
use super::response::ResponseWriter;

/// Per-request state passed through every step of an execution stack.
///
/// `req` is the read surface, `res` the write surface. The routing core
/// never interprets either; it only checks [`ResponseWriter::is_sent`] to
/// stop the chain after a commit.
#[derive(Debug)]
pub struct Context {
    pub req: Request,
    pub res: ResponseWriter,
}

impl Context {
    #[must_use]
    pub fn new(req: Request) -> Self {
        Self {
            req,
            res: ResponseWriter::default(),
        }
    }
}
