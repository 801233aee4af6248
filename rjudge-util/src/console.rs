use std::io::{self, BufRead as _, Write};

use anyhow::anyhow;
use console::Term;

#[derive(Debug)]
enum Inner {
    Term(Term),
    Buf {
        input: io::BufReader<io::Cursor<String>>,
        output: Vec<u8>,
    },
}

/// Config for console.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct ConsoleConfig {
    /// If true, assumes yes and skips any confirmation.
    pub assume_yes: bool,
}

/// User facing output of the command line front-end.
///
/// Background workers never write here; they log through `tracing`.
#[derive(Debug)]
pub struct Console {
    inner: Inner,
    conf: ConsoleConfig,
}

impl Console {
    pub fn term(conf: ConsoleConfig) -> Self {
        Self {
            inner: Inner::Term(Term::stderr()),
            conf,
        }
    }

    pub fn buf(conf: ConsoleConfig) -> Self {
        Self {
            inner: Inner::Buf {
                input: io::BufReader::new(io::Cursor::new(String::new())),
                output: Vec::new(),
            },
            conf,
        }
    }

    #[cfg(test)]
    fn write_input(&mut self, s: &str) {
        if let Inner::Buf { ref mut input, .. } = self.inner {
            input.get_mut().get_mut().push_str(s)
        }
    }

    /// Output written so far to a buffer console.
    pub fn take_output(self) -> crate::Result<String> {
        match self.inner {
            Inner::Buf { output, .. } => Ok(String::from_utf8(output)?),
            Inner::Term(_) => Err(anyhow!("Could not take output from terminal console")),
        }
    }

    #[inline]
    fn as_mut_write(&mut self) -> &mut dyn Write {
        match self.inner {
            Inner::Term(ref mut w) => w,
            Inner::Buf {
                output: ref mut w, ..
            } => w,
        }
    }

    pub fn warn(&mut self, message: &str) -> io::Result<()> {
        writeln!(self, "{} {}", sty_y("WARN:"), message)
    }

    pub fn confirm(&mut self, message: &str, default: bool) -> io::Result<bool> {
        if self.conf.assume_yes {
            return Ok(true);
        }

        let prompt = format!("{} ({}) ", message, if default { "Y/n" } else { "y/N" });
        write!(self, "{}", prompt)?;
        self.flush()?;
        let input = self.read_user()?;
        match input.trim().to_lowercase().as_str() {
            "y" | "yes" => Ok(true),
            "n" | "no" => Ok(false),
            _ => Ok(default),
        }
    }

    fn read_user(&mut self) -> io::Result<String> {
        match self.inner {
            Inner::Term(ref term) => term.read_line(),
            Inner::Buf { ref mut input, .. } => {
                let mut buf = String::new();
                input.read_line(&mut buf)?;
                Ok(buf)
            }
        }
    }
}

impl Write for Console {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.as_mut_write().write(buf)
    }

    #[inline]
    fn flush(&mut self) -> io::Result<()> {
        self.as_mut_write().flush()
    }
}

macro_rules! def_color {
    ($name:ident, $name_upper:ident, $style:expr) => {
        ::lazy_static::lazy_static! {
            static ref $name_upper: ::console::Style = {
                use ::console::Style;
                $style
            };
        }

        pub fn $name<D>(val: D) -> ::console::StyledObject<D> {
            $name_upper.apply_to(val)
        }
    };
}

pub use color_defs::*;

#[cfg_attr(tarpaulin, ignore)]
mod color_defs {
    def_color!(sty_r, STY_R, Style::new().red());
    def_color!(sty_g, STY_G, Style::new().green());
    def_color!(sty_y, STY_Y, Style::new().yellow());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warn() -> anyhow::Result<()> {
        console::set_colors_enabled(false);
        let mut cnsl = Console::buf(ConsoleConfig::default());
        cnsl.warn("message")?;
        let output_str = cnsl.take_output()?;
        assert_eq!(output_str, "WARN: message\n");
        Ok(())
    }

    #[test]
    fn test_confirm() -> anyhow::Result<()> {
        let tests = &[
            (true, "", false, true),
            (false, "y", false, true),
            (false, "Yes", false, true),
            (false, "n", true, false),
            (false, "No", true, false),
            (false, "hoge", true, true),
            (false, "hoge", false, false),
            (false, "", true, true),
            (false, "", false, false),
        ];
        for (assume_yes, input, default, expected) in tests {
            let conf = ConsoleConfig {
                assume_yes: *assume_yes,
            };
            let mut cnsl = Console::buf(conf);
            cnsl.write_input(input);
            let actual = cnsl.confirm("message", *default)?;
            assert_eq!(actual, *expected);
        }
        Ok(())
    }

    #[test]
    fn test_take_output() -> anyhow::Result<()> {
        let mut cnsl = Console::buf(ConsoleConfig::default());
        write!(cnsl, "Submitting 1200A as alice ... ")?;
        writeln!(cnsl, "done")?;
        assert_eq!(cnsl.take_output()?, "Submitting 1200A as alice ... done\n");
        Ok(())
    }
}
