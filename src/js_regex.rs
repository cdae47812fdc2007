use std::fmt;

#[derive(Debug, Clone)]
pub(crate) struct Regex {
    backend: fancy_regex::Regex,
}

impl Regex {
    pub(crate) fn new(pattern: &str) -> Result<Self, RegexError> {
        let backend = fancy_regex::Regex::new(pattern).map_err(RegexError::from)?;
        Ok(Self { backend })
    }

    pub(crate) fn captures(&self, input: &str) -> Result<Option<Captures>, RegexError> {
        let captures = self.backend.captures(input).map_err(RegexError::from)?;
        Ok(captures
            .as_ref()
            .map(|captures| Captures::from_backend(&self.backend, captures)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Captures {
    groups: Vec<(Option<String>, Option<String>)>,
}

impl Captures {
    fn from_backend(regex: &fancy_regex::Regex, captures: &fancy_regex::Captures<'_>) -> Self {
        let mut groups = Vec::with_capacity(captures.len());
        for (idx, group_name) in regex.capture_names().enumerate() {
            let text = captures.get(idx).map(|matched| matched.as_str().to_string());
            groups.push((group_name.map(str::to_string), text));
        }
        Self { groups }
    }

    pub(crate) fn name(&self, group: &str) -> Option<&str> {
        self.groups
            .iter()
            .find(|(group_name, _)| group_name.as_deref() == Some(group))
            .and_then(|(_, text)| text.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RegexError {
    message: String,
}

impl fmt::Display for RegexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for RegexError {}

impl From<fancy_regex::Error> for RegexError {
    fn from(value: fancy_regex::Error) -> Self {
        Self {
            message: value.to_string(),
        }
    }
}
