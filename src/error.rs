use flowly::Void;

#[derive(Debug, thiserror::Error)]
pub enum Error<E = Void> {
    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unexpected end of data: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    #[error("Wrong magic: {0:#010x}")]
    BadMagic(u32),

    #[error("Wrong format tag")]
    BadFormatTag,

    #[error("Bad event record size: {0}")]
    BadRecordSize(u8),

    #[error("Unknown descriptor tag: {0:#04x}")]
    InvalidDescriptor(u8),

    #[error(transparent)]
    Other(E),
}

impl Error {
    pub fn extend<E>(self) -> Error<E> {
        match self {
            Error::Io(err) => Error::Io(err),
            Error::UnexpectedEof { needed, remaining } => Error::UnexpectedEof { needed, remaining },
            Error::BadMagic(magic) => Error::BadMagic(magic),
            Error::BadFormatTag => Error::BadFormatTag,
            Error::BadRecordSize(size) => Error::BadRecordSize(size),
            Error::InvalidDescriptor(tag) => Error::InvalidDescriptor(tag),
            Error::Other(_) => unreachable!(),
        }
    }
}
