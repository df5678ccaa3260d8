#![forbid(unsafe_code)]

pub mod ids {
    /// Stable identifier of a knowledge node. Ids are never reused, so the
    /// grammar is deliberately narrow: path separators in particular are
    /// forbidden because ids become document path segments.
    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    pub struct NodeId(String);

    impl NodeId {
        pub fn as_str(&self) -> &str {
            &self.0
        }

        pub fn into_string(self) -> String {
            self.0
        }

        pub fn try_new(value: impl Into<String>) -> Result<Self, NodeIdError> {
            let value = value.into();
            validate_node_id(&value)?;
            Ok(Self(value))
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum NodeIdError {
        Empty,
        TooLong,
        InvalidFirstChar,
        InvalidChar { ch: char, index: usize },
    }

    impl std::fmt::Display for NodeIdError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Self::Empty => write!(f, "node id must not be empty"),
                Self::TooLong => write!(f, "node id must be at most 128 chars"),
                Self::InvalidFirstChar => {
                    write!(f, "node id must start with an ascii letter or digit")
                }
                Self::InvalidChar { ch, index } => {
                    write!(f, "node id has invalid char {ch:?} at index {index}")
                }
            }
        }
    }

    impl std::error::Error for NodeIdError {}

    fn validate_node_id(value: &str) -> Result<(), NodeIdError> {
        if value.is_empty() {
            return Err(NodeIdError::Empty);
        }
        if value.len() > 128 {
            return Err(NodeIdError::TooLong);
        }
        let mut chars = value.chars();
        let Some(first) = chars.next() else {
            return Err(NodeIdError::Empty);
        };
        if !first.is_ascii_alphanumeric() {
            return Err(NodeIdError::InvalidFirstChar);
        }
        for (index, ch) in value.chars().enumerate() {
            if index == 0 {
                continue;
            }
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
                continue;
            }
            return Err(NodeIdError::InvalidChar { ch, index });
        }
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn accepts_plain_ids() {
            assert!(NodeId::try_new("F1").is_ok());
            assert!(NodeId::try_new("intro-2024.v1_a").is_ok());
        }

        #[test]
        fn rejects_path_separators() {
            assert!(matches!(
                NodeId::try_new("a/b"),
                Err(NodeIdError::InvalidChar { ch: '/', .. })
            ));
            assert!(matches!(
                NodeId::try_new("a\\b"),
                Err(NodeIdError::InvalidChar { ch: '\\', .. })
            ));
        }

        #[test]
        fn rejects_empty_and_bad_first_char() {
            assert_eq!(NodeId::try_new(""), Err(NodeIdError::Empty));
            assert_eq!(NodeId::try_new("-x"), Err(NodeIdError::InvalidFirstChar));
        }
    }
}

pub mod model {
    /// Structural kind of a catalog entry. Folders group; leaves may carry a
    /// markdown document.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum NodeKind {
        Folder,
        Leaf,
    }

    impl NodeKind {
        pub fn as_str(self) -> &'static str {
            match self {
                NodeKind::Folder => "folder",
                NodeKind::Leaf => "leaf",
            }
        }

        pub fn parse(value: &str) -> Option<Self> {
            match value.trim() {
                "folder" => Some(NodeKind::Folder),
                "leaf" => Some(NodeKind::Leaf),
                _ => None,
            }
        }
    }

    /// Display-only relation between two nodes. Never affects tree shape.
    pub const DEFAULT_DEPENDENCY_KIND: &str = "related";
}
