//! Core logic behind the `json-fmt` binary.

use std::io::Read;

use thiserror::Error;

use crate::{JsonMapper, MapperConfig, MapperError, WriterConfig};

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Mapper(#[from] MapperError),
    #[error("{0}")]
    Usage(String),
}

/// Command-line options of `json-fmt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FormatOptions {
    pub pretty: bool,
    pub indent: Option<usize>,
}

impl FormatOptions {
    /// Parses `--pretty` and `--indent N`; anything else is a usage error.
    pub fn from_args<I, S>(args: I) -> Result<Self, CliError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut options = FormatOptions::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_ref() {
                "--pretty" => options.pretty = true,
                "--indent" => {
                    let value = args
                        .next()
                        .ok_or_else(|| CliError::Usage("--indent needs a value".into()))?;
                    let indent = value.as_ref().parse().map_err(|_| {
                        CliError::Usage(format!("invalid indent: {}", value.as_ref()))
                    })?;
                    options.indent = Some(indent);
                    options.pretty = true;
                }
                other => return Err(CliError::Usage(format!("unknown argument: {other}"))),
            }
        }
        Ok(options)
    }

    pub fn mapper_config(&self) -> MapperConfig {
        let defaults = WriterConfig::default();
        MapperConfig {
            writer: WriterConfig {
                pretty_print: self.pretty,
                indent: self.indent.unwrap_or(defaults.indent),
            },
            ..MapperConfig::default()
        }
    }
}

/// Reads a document from `input` into a dynamic value and writes it back out.
pub fn format_json(input: impl Read, options: FormatOptions) -> Result<String, CliError> {
    let mapper = JsonMapper::with_config(options.mapper_config());
    let data = mapper.to_object_from_text(input)?;
    Ok(mapper.to_json(&data)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags() {
        assert_eq!(
            FormatOptions::from_args(["--indent", "2"]).unwrap(),
            FormatOptions {
                pretty: true,
                indent: Some(2),
            }
        );
        assert!(FormatOptions::from_args(["--indent"]).is_err());
        assert!(FormatOptions::from_args(["--indent", "x"]).is_err());
        assert!(FormatOptions::from_args(["-q"]).is_err());
        assert!(FormatOptions::from_args(Vec::<String>::new()).unwrap() == FormatOptions::default());
    }

    #[test]
    fn compacts_by_default() {
        let out = format_json("{ \"a\" : [ 1 , 2.5 ] }".as_bytes(), FormatOptions::default()).unwrap();
        assert_eq!(out, r#"{"a":[1,2.5]}"#);
    }

    #[test]
    fn pretty_prints_with_indent() {
        let options = FormatOptions::from_args(["--indent", "2"]).unwrap();
        let out = format_json(r#"{"a":[1]}"#.as_bytes(), options).unwrap();
        assert!(out.contains("\n  \"a\""), "{out}");
    }

    #[test]
    fn reports_malformed_input() {
        let err = format_json("{\"a\":}".as_bytes(), FormatOptions::default()).unwrap_err();
        assert!(matches!(err, CliError::Mapper(MapperError::Json(_))));
    }

    #[test]
    fn reports_unreadable_input() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("pipe closed"))
            }
        }
        let err = format_json(Broken, FormatOptions::default()).unwrap_err();
        assert!(err.to_string().contains("pipe closed"), "{err}");
    }
}
