use std::fmt;
use std::rc::Rc;

/// Source position sampled when a bytecode or symbol is created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub file: Option<Rc<str>>,
    pub line: u64,
}

impl Location {
    pub fn new(file: impl Into<Rc<str>>, line: u64) -> Self {
        Location {
            file: Some(file.into()),
            line,
        }
    }

    pub fn file_name(&self) -> &str {
        self.file.as_deref().unwrap_or("<unknown>")
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file_name(), self.line)
    }
}
