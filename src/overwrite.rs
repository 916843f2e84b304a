//! Asks before clobbering existing files.

use std::collections::VecDeque;
use std::io;
use std::path::Path;

use console::Term;

/// Where overwrite answers come from: the console, or a script in tests.
pub trait KeySource {
    /// Shown once per question.
    fn announce(&mut self, path: &Path) -> io::Result<()>;

    /// Blocks until one key is read.
    fn read_key(&mut self) -> io::Result<char>;

    /// Wipes the line an unrecognized key left behind.
    fn clear_line(&mut self) -> io::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    AllowOnce,
    DenyOnce,
    AllowAlways,
}

impl Decision {
    fn from_key(key: char) -> Option<Self> {
        match key.to_ascii_uppercase() {
            'Y' => Some(Decision::AllowOnce),
            'N' => Some(Decision::DenyOnce),
            'A' => Some(Decision::AllowAlways),
            _ => None,
        }
    }
}

/// Owned by the driver for the whole run. Once the user answers `A` every
/// later question is answered yes without reading a key.
#[derive(Debug)]
pub struct OverwriteGuard<K> {
    keys: K,
    always_overwrite: bool,
}

impl<K: KeySource> OverwriteGuard<K> {
    pub fn new(keys: K) -> Self {
        OverwriteGuard {
            keys,
            always_overwrite: false,
        }
    }

    pub fn always_overwrite(&self) -> bool {
        self.always_overwrite
    }

    pub fn keys(&self) -> &K {
        &self.keys
    }

    pub fn decide(&mut self, path: &Path) -> io::Result<bool> {
        if self.always_overwrite {
            return Ok(true);
        }

        self.keys.announce(path)?;
        let decision = loop {
            match Decision::from_key(self.keys.read_key()?) {
                Some(decision) => break decision,
                None => self.keys.clear_line()?,
            }
        };

        Ok(match decision {
            Decision::AllowOnce => true,
            Decision::DenyOnce => false,
            Decision::AllowAlways => {
                self.always_overwrite = true;
                true
            }
        })
    }
}

/// Single key presses from the terminal.
#[derive(Debug)]
pub struct ConsoleKeys {
    term: Term,
}

impl ConsoleKeys {
    pub fn new() -> Self {
        ConsoleKeys {
            term: Term::stdout(),
        }
    }
}

impl Default for ConsoleKeys {
    fn default() -> Self {
        Self::new()
    }
}

impl KeySource for ConsoleKeys {
    fn announce(&mut self, path: &Path) -> io::Result<()> {
        self.term.write_line("")?;
        self.term.write_line(&format!(
            "The file: {} already exists. Do you want to overwrite it? Y/N/A",
            path.display()
        ))
    }

    fn read_key(&mut self) -> io::Result<char> {
        self.term.read_char()
    }

    fn clear_line(&mut self) -> io::Result<()> {
        self.term.clear_line()
    }
}

/// Replays a fixed sequence of keys. Running out is an `UnexpectedEof`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedKeys {
    keys: VecDeque<char>,
    announced: usize,
}

impl ScriptedKeys {
    pub fn new(keys: &str) -> Self {
        ScriptedKeys {
            keys: keys.chars().collect(),
            announced: 0,
        }
    }

    /// Keys not read yet.
    pub fn remaining(&self) -> usize {
        self.keys.len()
    }

    /// How many questions were asked.
    pub fn announced(&self) -> usize {
        self.announced
    }
}

impl KeySource for ScriptedKeys {
    fn announce(&mut self, _: &Path) -> io::Result<()> {
        self.announced += 1;
        Ok(())
    }

    fn read_key(&mut self) -> io::Result<char> {
        self.keys
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no more scripted keys"))
    }

    fn clear_line(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> &'static Path {
        Path::new("x.bin")
    }

    #[test]
    fn yes_then_always_short_circuits() {
        let mut guard = OverwriteGuard::new(ScriptedKeys::new("YAq"));
        let answers: Vec<bool> = (0..3).map(|_| guard.decide(path()).unwrap()).collect();
        assert_eq!(answers, [true, true, true]);
        assert!(guard.always_overwrite());
        // the third call never read a key
        assert_eq!(guard.keys().remaining(), 1);
        assert_eq!(guard.keys().announced(), 2);
    }

    #[test]
    fn no_denies_once() {
        let mut guard = OverwriteGuard::new(ScriptedKeys::new("ny"));
        assert!(!guard.decide(path()).unwrap());
        assert!(guard.decide(path()).unwrap());
        assert!(!guard.always_overwrite());
    }

    #[test]
    fn unrecognized_keys_are_read_again() {
        let mut guard = OverwriteGuard::new(ScriptedKeys::new("x?\nN"));
        assert!(!guard.decide(path()).unwrap());
        assert_eq!(guard.keys().remaining(), 0);
        assert_eq!(guard.keys().announced(), 1);
    }

    #[test]
    fn running_out_of_keys_is_an_error() {
        let mut guard = OverwriteGuard::new(ScriptedKeys::new("z"));
        let err = guard.decide(path()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
