use std::fmt;

/// Indentation-aware writer used by every `print` dump.
pub struct Printer<'a> {
    out: &'a mut dyn fmt::Write,
    level: usize,
    width: usize,
}

impl<'a> Printer<'a> {
    pub fn new(out: &'a mut dyn fmt::Write) -> Self {
        Self::with_width(out, 1)
    }

    pub fn with_width(out: &'a mut dyn fmt::Write, width: usize) -> Self {
        Printer {
            out,
            level: 0,
            width,
        }
    }

    pub fn line(&mut self, args: fmt::Arguments<'_>) -> fmt::Result {
        write!(self.out, "{:indent$}", "", indent = self.level * self.width)?;
        self.out.write_fmt(args)?;
        self.out.write_char('\n')
    }

    /// Run `f` one level deeper.
    pub fn nest<F>(&mut self, f: F) -> fmt::Result
    where
        F: FnOnce(&mut Self) -> fmt::Result,
    {
        self.level += 1;
        let res = f(self);
        self.level -= 1;
        res
    }
}

#[macro_export]
macro_rules! pline {
    ($p:expr, $($arg:tt)*) => {
        $p.line(format_args!($($arg)*))
    };
}
