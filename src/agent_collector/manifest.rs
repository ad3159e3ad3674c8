use crate::errors::LoadError;

/// One `- key: "capabilities"` item of a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Declaration {
    pub key: String,
    pub capabilities: Vec<String>,
    pub line: usize,
}

fn manifest_error(line: usize, reason: impl Into<String>) -> LoadError {
    LoadError::Manifest {
        line,
        reason: reason.into(),
    }
}

/// Parses the small YAML subset manifests are written in:
///
/// ```yaml
/// # comment
/// implementations:
///   - llm_hinter: "name hint similarity_search"
/// ```
pub(crate) fn parse_manifest(yaml: &str) -> Result<Vec<Declaration>, LoadError> {
    let mut declarations = Vec::new();
    let mut in_implementations = false;

    for (i, line) in yaml.lines().enumerate() {
        let line_no = i + 1;
        let line = strip_comment(line).trim_end();

        // Skip empty lines
        if line.trim().is_empty() {
            continue;
        }

        if !in_implementations {
            let Some(rest) = line.strip_prefix("implementations:") else {
                return Err(manifest_error(line_no, "expected 'implementations:' key"));
            };
            if !rest.trim().is_empty() {
                return Err(manifest_error(
                    line_no,
                    "'implementations' must be followed by a list",
                ));
            }
            in_implementations = true;
            continue;
        }

        // Inside the list, expect lines like: '- key: "value"'
        let line = line.trim_start();
        let Some(rest) = line.strip_prefix('-') else {
            return Err(manifest_error(line_no, "expected list item starting with '-'"));
        };
        let rest = rest.trim_start();
        let Some((key, value)) = rest.split_once(':') else {
            return Err(manifest_error(line_no, "missing ':' in list item"));
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(manifest_error(line_no, "empty implementation key"));
        }

        let value = value.trim();
        let Some(value) = value
            .strip_prefix('"')
            .and_then(|value| value.strip_suffix('"'))
        else {
            return Err(manifest_error(line_no, "value must be quoted with double quotes"));
        };

        declarations.push(Declaration {
            key: key.to_owned(),
            capabilities: value.split_whitespace().map(String::from).collect(),
            line: line_no,
        });
    }

    if !in_implementations {
        return Err(manifest_error(1, "missing 'implementations' key"));
    }
    Ok(declarations)
}

fn strip_comment(line: &str) -> &str {
    let mut in_quotes = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '#' if !in_quotes => return &line[..i],
            _ => {}
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_items_and_comments() {
        let yaml = "# agent\nimplementations:\n  \
                    - llm_hinter: \"name hint similarity_search\" # main\n\n  - helper: \"\"\n";
        let declarations = parse_manifest(yaml).unwrap();
        assert_eq!(declarations.len(), 2);
        assert_eq!(declarations[0].key, "llm_hinter");
        assert_eq!(
            declarations[0].capabilities,
            vec!["name", "hint", "similarity_search"]
        );
        assert_eq!(declarations[0].line, 3);
        assert!(declarations[1].capabilities.is_empty());
    }

    #[test]
    fn reports_the_offending_line() {
        let err = parse_manifest("implementations:\n  - template: name hint\n").unwrap_err();
        assert!(matches!(err, LoadError::Manifest { line: 2, .. }));

        let err = parse_manifest("agents:\n").unwrap_err();
        assert!(matches!(err, LoadError::Manifest { line: 1, .. }));

        let err = parse_manifest("implementations:\n  template: \"name\"\n").unwrap_err();
        assert!(matches!(err, LoadError::Manifest { line: 2, .. }));
    }

    #[test]
    fn empty_manifest_is_rejected() {
        assert!(parse_manifest("# nothing here\n").is_err());
    }
}
