use std::fmt;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum WordgridErrorKind {
    Args,
    Content,
    Io,
    Parse,
    Serialize,
}

impl WordgridErrorKind {
    pub fn with_error<E>(self, source: E) -> WordgridError
    where
        anyhow::Error: From<E>,
    {
        WordgridError {
            kind: self,
            source: From::from(source),
        }
    }
}

#[derive(thiserror::Error, Debug)]
#[error("WordgridError(kind={kind:?}, source={source})")]
pub struct WordgridError {
    pub kind: WordgridErrorKind,
    #[source]
    source: anyhow::Error,
}

impl WordgridError {
    pub fn add_context<C>(self, ctx: C) -> Self
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        WordgridError {
            kind: self.kind,
            source: self.source.context(ctx),
        }
    }

    pub fn kind(&self) -> WordgridErrorKind {
        self.kind
    }
}
