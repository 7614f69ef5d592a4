//! Wire identifier table
//!
//! Every identifier is a single byte. Commands travel client to server,
//! answers server to client. Parameter tags introduce a typed parameter and
//! error codes follow an `AnsNak`.

use std::fmt;

/// One identifier byte from the closed wire enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Identifier {
    ComListNg = 1,
    ComCreateNg = 2,
    ComDeleteNg = 3,
    ComListArt = 4,
    ComCreateArt = 5,
    ComDeleteArt = 6,
    ComGetArt = 7,
    ComEnd = 8,

    AnsListNg = 20,
    AnsCreateNg = 21,
    AnsDeleteNg = 22,
    AnsListArt = 23,
    AnsCreateArt = 24,
    AnsDeleteArt = 25,
    AnsGetArt = 26,
    AnsEnd = 27,
    AnsAck = 28,
    AnsNak = 29,

    ParString = 40,
    ParNum = 41,

    ErrNgAlreadyExists = 50,
    ErrNgDoesNotExist = 51,
    ErrArtDoesNotExist = 52,
    ErrInternalFailure = 53,
}

impl Identifier {
    /// Every identifier, in wire-value order
    pub const ALL: [Identifier; 24] = [
        Self::ComListNg,
        Self::ComCreateNg,
        Self::ComDeleteNg,
        Self::ComListArt,
        Self::ComCreateArt,
        Self::ComDeleteArt,
        Self::ComGetArt,
        Self::ComEnd,
        Self::AnsListNg,
        Self::AnsCreateNg,
        Self::AnsDeleteNg,
        Self::AnsListArt,
        Self::AnsCreateArt,
        Self::AnsDeleteArt,
        Self::AnsGetArt,
        Self::AnsEnd,
        Self::AnsAck,
        Self::AnsNak,
        Self::ParString,
        Self::ParNum,
        Self::ErrNgAlreadyExists,
        Self::ErrNgDoesNotExist,
        Self::ErrArtDoesNotExist,
        Self::ErrInternalFailure,
    ];

    /// The byte written on the wire
    #[must_use]
    #[inline]
    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    /// Wire name as used in protocol documentation and logs
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ComListNg => "COM_LIST_NG",
            Self::ComCreateNg => "COM_CREATE_NG",
            Self::ComDeleteNg => "COM_DELETE_NG",
            Self::ComListArt => "COM_LIST_ART",
            Self::ComCreateArt => "COM_CREATE_ART",
            Self::ComDeleteArt => "COM_DELETE_ART",
            Self::ComGetArt => "COM_GET_ART",
            Self::ComEnd => "COM_END",
            Self::AnsListNg => "ANS_LIST_NG",
            Self::AnsCreateNg => "ANS_CREATE_NG",
            Self::AnsDeleteNg => "ANS_DELETE_NG",
            Self::AnsListArt => "ANS_LIST_ART",
            Self::AnsCreateArt => "ANS_CREATE_ART",
            Self::AnsDeleteArt => "ANS_DELETE_ART",
            Self::AnsGetArt => "ANS_GET_ART",
            Self::AnsEnd => "ANS_END",
            Self::AnsAck => "ANS_ACK",
            Self::AnsNak => "ANS_NAK",
            Self::ParString => "PAR_STRING",
            Self::ParNum => "PAR_NUM",
            Self::ErrNgAlreadyExists => "ERR_NG_ALREADY_EXISTS",
            Self::ErrNgDoesNotExist => "ERR_NG_DOES_NOT_EXIST",
            Self::ErrArtDoesNotExist => "ERR_ART_DOES_NOT_EXIST",
            Self::ErrInternalFailure => "ERR_INTERNAL_FAILURE",
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.as_byte())
    }
}

impl TryFrom<u8> for Identifier {
    type Error = u8;

    /// Look up a wire byte, handing the byte back when it is not in the table
    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .iter()
            .copied()
            .find(|id| id.as_byte() == byte)
            .ok_or(byte)
    }
}

/// Renders a raw identifier byte with its wire name when known
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawIdentifier(pub u8);

impl fmt::Display for RawIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match Identifier::try_from(self.0) {
            Ok(id) => write!(f, "{id}"),
            Err(byte) => write!(f, "UNKNOWN({byte})"),
        }
    }
}

/// Type of one parameter slot in a request or response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    String,
    Number,
}

impl ParameterKind {
    /// Tag byte introducing a parameter of this kind
    #[must_use]
    pub const fn tag(self) -> Identifier {
        match self {
            Self::String => Identifier::ParString,
            Self::Number => Identifier::ParNum,
        }
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("string parameter"),
            Self::Number => f.write_str("number parameter"),
        }
    }
}

/// The seven request/response operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListNewsgroups,
    CreateNewsgroup,
    DeleteNewsgroup,
    ListArticles,
    CreateArticle,
    DeleteArticle,
    GetArticle,
}

impl Operation {
    pub const ALL: [Operation; 7] = [
        Self::ListNewsgroups,
        Self::CreateNewsgroup,
        Self::DeleteNewsgroup,
        Self::ListArticles,
        Self::CreateArticle,
        Self::DeleteArticle,
        Self::GetArticle,
    ];

    /// Command identifier that opens a request for this operation
    #[must_use]
    pub const fn command(self) -> Identifier {
        match self {
            Self::ListNewsgroups => Identifier::ComListNg,
            Self::CreateNewsgroup => Identifier::ComCreateNg,
            Self::DeleteNewsgroup => Identifier::ComDeleteNg,
            Self::ListArticles => Identifier::ComListArt,
            Self::CreateArticle => Identifier::ComCreateArt,
            Self::DeleteArticle => Identifier::ComDeleteArt,
            Self::GetArticle => Identifier::ComGetArt,
        }
    }

    /// Answer identifier that opens the response for this operation
    #[must_use]
    pub const fn answer(self) -> Identifier {
        match self {
            Self::ListNewsgroups => Identifier::AnsListNg,
            Self::CreateNewsgroup => Identifier::AnsCreateNg,
            Self::DeleteNewsgroup => Identifier::AnsDeleteNg,
            Self::ListArticles => Identifier::AnsListArt,
            Self::CreateArticle => Identifier::AnsCreateArt,
            Self::DeleteArticle => Identifier::AnsDeleteArt,
            Self::GetArticle => Identifier::AnsGetArt,
        }
    }

    /// Fixed parameter list of the request, in wire order
    #[must_use]
    pub const fn parameters(self) -> &'static [ParameterKind] {
        use ParameterKind::{Number, String};
        match self {
            Self::ListNewsgroups => &[],
            Self::CreateNewsgroup => &[String],
            Self::DeleteNewsgroup | Self::ListArticles => &[Number],
            Self::CreateArticle => &[Number, String, String, String],
            Self::DeleteArticle | Self::GetArticle => &[Number, Number],
        }
    }

    /// Operation opened by a command identifier
    #[must_use]
    pub fn from_command(id: Identifier) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.command() == id)
    }

    /// Operation answered by an answer identifier
    #[must_use]
    pub fn from_answer(id: Identifier) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.answer() == id)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ListNewsgroups => "list newsgroups",
            Self::CreateNewsgroup => "create newsgroup",
            Self::DeleteNewsgroup => "delete newsgroup",
            Self::ListArticles => "list articles",
            Self::CreateArticle => "create article",
            Self::DeleteArticle => "delete article",
            Self::GetArticle => "get article",
        };
        f.write_str(name)
    }
}
