//! 类型定义模块

mod outcome;
mod protocol;
mod record;
mod request;
mod settings;

pub use outcome::{AccountOutcome, AccountSummary, ConnectionInfo, ConnectionUri, RestartOutcome};
pub use protocol::{LookupKey, Protocol};
pub use record::{AccountCollection, AccountRecord, DEFAULT_ALTER_ID, DEFAULT_USERNAME};
pub use request::{
    AccountForm, DeleteForm, DeleteTarget, MutationRequest, Operation, RequestContext,
    ValidatedAccount, ValidatedDelete,
};
pub use settings::{DuplicatePolicy, EditMissPolicy, EngineSettings, UriProfile};
