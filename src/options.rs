//! Command line option resolution.
//!
//! The command line is `<path> [pack|unpack|0|1] [options]`. Leading non-flag
//! tokens are positional; every token starting with `-` after them is looked
//! up in [`REGISTRY`]. Unknown flags are ignored.

use std::collections::BTreeMap;

use crate::procedure::Procedure;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Flag {
    Recursive,
    NameId,
    NameIdExt,
    MinNameLength,
    Endianness,
    Continue,
    MaxDepth,
    Help,
}

impl Flag {
    fn bit(self) -> u32 {
        1 << self as u32
    }
}

#[derive(Debug)]
pub struct FlagSpec {
    pub flag: Flag,
    pub short: &'static str,
    pub long: &'static str,
    pub takes_argument: bool,
    pub help: &'static str,
}

pub const REGISTRY: &[FlagSpec] = &[
    FlagSpec { flag: Flag::Recursive, short: "-r", long: "--recursive", takes_argument: false, help: "descend every subdirectory when unpacking a directory of containers" },
    FlagSpec { flag: Flag::NameId, short: "-ni", long: "--nameid", takes_argument: false, help: "generate short name identifiers (names up to 32 characters)" },
    FlagSpec { flag: Flag::NameIdExt, short: "-nie", long: "--nameidext", takes_argument: false, help: "generate extended name identifiers (names up to 64 characters)" },
    FlagSpec { flag: Flag::MinNameLength, short: "-mnl", long: "--minnamelength", takes_argument: true, help: "minimum name field length, `auto` or a number" },
    FlagSpec { flag: Flag::Endianness, short: "-en", long: "--endianness", takes_argument: true, help: "output byte order, `littleendian` or `bigendian`" },
    FlagSpec { flag: Flag::Continue, short: "-c", long: "--continue", takes_argument: false, help: "don't wait for a key press at the end" },
    FlagSpec { flag: Flag::MaxDepth, short: "-md", long: "--maxdepth", takes_argument: true, help: "maximum container nesting depth to unpack" },
    FlagSpec { flag: Flag::Help, short: "-h", long: "--help", takes_argument: false, help: "print this help" },
];

fn is_flag(token: &str) -> bool {
    token.starts_with('-')
}

fn lookup(token: &str) -> Option<&'static FlagSpec> {
    REGISTRY
        .iter()
        .find(|spec| spec.short.eq_ignore_ascii_case(token) || spec.long.eq_ignore_ascii_case(token))
}

/// Resolved command line. Built once, read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    target: Option<String>,
    directive: Option<Procedure>,
    flags: u32,
    arguments: BTreeMap<Flag, Vec<String>>,
}

impl Options {
    pub fn parse<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = args.into_iter().map(Into::into).collect();
        let mut options = Options::default();

        let mut i = 0;
        let mut positional = 0;
        while i < tokens.len() && !is_flag(&tokens[i]) {
            match positional {
                0 => options.target = Some(tokens[i].clone()),
                1 => options.directive = Procedure::from_directive(&tokens[i]),
                _ => {}
            }
            positional += 1;
            i += 1;
        }

        while i < tokens.len() {
            let spec = match lookup(&tokens[i]) {
                Some(spec) => spec,
                None => {
                    i += 1;
                    continue;
                }
            };
            options.flags |= spec.flag.bit();
            i += 1;

            if !spec.takes_argument {
                continue;
            }

            // Greedy: everything up to the next flag, stopping early on a
            // case-insensitive repeat of the previous value.
            let mut collected: Vec<String> = Vec::new();
            while i < tokens.len() && !is_flag(&tokens[i]) {
                if let Some(previous) = collected.last() {
                    if previous.eq_ignore_ascii_case(&tokens[i]) {
                        break;
                    }
                }
                collected.push(tokens[i].clone());
                i += 1;
            }
            options.arguments.insert(spec.flag, collected);
        }

        options
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn directive(&self) -> Option<Procedure> {
        self.directive
    }

    pub fn has(&self, flag: Flag) -> bool {
        self.flags & flag.bit() != 0
    }

    /// Raw argument tokens of a valued flag, `None` when the flag was not given.
    pub fn arguments(&self, flag: Flag) -> Option<&[String]> {
        self.arguments.get(&flag).map(Vec::as_slice)
    }

    /// First argument token of a valued flag.
    pub fn first_argument(&self, flag: Flag) -> Option<&str> {
        self.arguments(flag)
            .and_then(|args| args.first())
            .map(String::as_str)
    }
}

pub fn usage() -> String {
    let mut text = String::from(
        "Usage: pac-packer <path> [pack|unpack|0|1] [options]\n\
         The path and procedure must come before any option.\n\nOptions:\n",
    );
    for spec in REGISTRY {
        let names = format!("{}, {}", spec.short, spec.long);
        text.push_str(&format!("  {:<22}{}\n", names, spec.help));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_target_and_directive() {
        let options = Options::parse(vec!["data", "UNPACK", "-r"]);
        assert_eq!(options.target(), Some("data"));
        assert_eq!(options.directive(), Some(Procedure::Unpack));
        assert!(options.has(Flag::Recursive));

        let options = Options::parse(vec!["data", "0"]);
        assert_eq!(options.directive(), Some(Procedure::Pack));

        let options = Options::parse(vec!["data", "7"]);
        assert_eq!(options.directive(), None);

        let options = Options::parse(vec!["-r", "data"]);
        assert_eq!(options.target(), None);
    }

    #[test]
    fn flag_order_and_duplicates_do_not_matter() {
        let a = Options::parse(vec!["x", "-r", "--nameid", "-c"]);
        let b = Options::parse(vec!["x", "-c", "-NI", "--recursive", "-r", "-c"]);
        assert_eq!(a, b);
    }

    #[test]
    fn unknown_flags_are_ignored() {
        let options = Options::parse(vec!["x", "--bogus", "value", "-r"]);
        assert_eq!(options, Options::parse(vec!["x", "-r"]));
    }

    #[test]
    fn valued_flag_collects_until_next_flag() {
        let options = Options::parse(vec!["x", "-mnl", "auto", "32", "-r"]);
        assert_eq!(
            options.arguments(Flag::MinNameLength),
            Some(&["auto".to_string(), "32".to_string()][..])
        );
        assert!(options.has(Flag::Recursive));
    }

    #[test]
    fn valued_flag_stops_on_adjacent_duplicate() {
        let options = Options::parse(vec!["x", "-en", "BigEndian", "bigendian", "littleendian"]);
        assert_eq!(
            options.arguments(Flag::Endianness),
            Some(&["BigEndian".to_string()][..])
        );
    }

    #[test]
    fn valued_flag_without_argument() {
        let options = Options::parse(vec!["x", "--minnamelength", "-c"]);
        assert!(options.has(Flag::MinNameLength));
        assert_eq!(options.arguments(Flag::MinNameLength), Some(&[][..]));
        assert_eq!(options.first_argument(Flag::MinNameLength), None);
        assert_eq!(options.arguments(Flag::Endianness), None);
    }

    #[test]
    fn usage_lists_every_flag() {
        let text = usage();
        for spec in REGISTRY {
            assert!(text.contains(spec.long));
        }
        assert!(text.contains("must come before any option"));
    }

    #[test]
    fn target_after_a_flag_is_not_positional() {
        let options = Options::parse(vec!["-r", "data"]);
        assert_eq!(options.target(), None);
        assert_eq!(options.arguments(Flag::Recursive), None);
    }
}
