//! Filename grammar for FG-NET images.
//!
//! Every image is named `<subject id>A<age><suffix>`, e.g. `001A02.JPG` or
//! `078A11a.JPG`: a run of digits, an uppercase `A`, a second run of digits
//! holding the subject's age in years, then anything (usually an optional
//! letter and the extension).

use thiserror::Error;

use crate::error::{DatasetError, Result};

/// Subject id and age decoded from an image filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedFilename {
    pub subject_id: u32,
    pub age: u32,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilenameError {
    #[error("expected a numeric subject id at the start of the name")]
    MissingSubjectId,

    #[error("expected 'A' after the subject id")]
    MissingSeparator,

    #[error("expected a numeric age after 'A'")]
    MissingAge,

    #[error("numeric field '{0}' is out of range")]
    OutOfRange(String),
}

/// Parses `<digits>A<digits>...`, returning the typed failure reason on mismatch.
pub fn parse_filename(name: &str) -> std::result::Result<ParsedFilename, FilenameError> {
    let (subject, rest) = split_digits(name);
    if subject.is_empty() {
        return Err(FilenameError::MissingSubjectId);
    }
    let rest = rest.strip_prefix('A').ok_or(FilenameError::MissingSeparator)?;
    let (age, _suffix) = split_digits(rest);
    if age.is_empty() {
        return Err(FilenameError::MissingAge);
    }

    Ok(ParsedFilename {
        subject_id: parse_number(subject)?,
        age: parse_number(age)?,
    })
}

/// Age embedded in `name`, wrapped in a `DatasetError` that names the file.
pub fn age_from_filename(name: &str) -> Result<u32> {
    parse_filename(name)
        .map(|parsed| parsed.age)
        .map_err(|source| DatasetError::Filename {
            name: name.to_string(),
            source,
        })
}

fn split_digits(s: &str) -> (&str, &str) {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s.split_at(end)
}

fn parse_number(digits: &str) -> std::result::Result<u32, FilenameError> {
    digits
        .parse()
        .map_err(|_| FilenameError::OutOfRange(digits.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_plain_name() {
        let parsed = parse_filename("001A23.jpg").unwrap();
        assert_eq!(parsed, ParsedFilename { subject_id: 1, age: 23 });
        assert_eq!(age_from_filename("001A23.jpg").unwrap(), 23);
    }

    #[test]
    fn test_parses_letter_suffix_and_uppercase_ext() {
        assert_eq!(age_from_filename("078A11a.JPG").unwrap(), 11);
        assert_eq!(age_from_filename("082A00.JPG").unwrap(), 0);
        // Nothing after the age is also fine
        assert_eq!(age_from_filename("5A7").unwrap(), 7);
    }

    #[test]
    fn test_rejects_nonconforming_names() {
        assert_eq!(parse_filename("A23.jpg"), Err(FilenameError::MissingSubjectId));
        assert_eq!(parse_filename(".DS_Store"), Err(FilenameError::MissingSubjectId));
        assert_eq!(parse_filename("001a23.jpg"), Err(FilenameError::MissingSeparator));
        assert_eq!(parse_filename("001"), Err(FilenameError::MissingSeparator));
        assert_eq!(parse_filename("001A.jpg"), Err(FilenameError::MissingAge));
        assert!(matches!(
            parse_filename("001A99999999999.jpg"),
            Err(FilenameError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_error_names_the_file() {
        let err = age_from_filename("readme.txt").unwrap_err();
        match &err {
            DatasetError::Filename { name, source } => {
                assert_eq!(name, "readme.txt");
                assert_eq!(*source, FilenameError::MissingSubjectId);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("readme.txt"));
    }
}
