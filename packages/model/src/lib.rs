//! # Lowcode Model
//!
//! Document tree for the low-code page editor.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ schema: persisted JSON page shape           │
//! └─────────────────────────────────────────────┘
//!                     ↓ load / export
//! ┌─────────────────────────────────────────────┐
//! │ page: id-addressed node arena               │
//! │  - nodes, props, slots                      │
//! │  - delete / copy / move / insert / update   │
//! └─────────────────────────────────────────────┘
//!                     ↓ emits
//! ┌─────────────────────────────────────────────┐
//! │ emitter: topic pub/sub with wildcard        │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Ids are identity**: generated once, never reused inside a page
//! 2. **Tree, not graph**: one parent per node, parent links are navigation only
//! 3. **Expected failures are no-ops**: unknown ids and illegal moves leave
//!    the tree untouched
//! 4. **Listeners read, never write**: handlers get `&Page`

pub mod emitter;
pub mod error;
pub mod events;
pub mod id_generator;
pub mod node;
pub mod page;
pub mod prop;
pub mod schema;

pub use emitter::{Emitter, SubscriptionId, Topic, WILDCARD};
pub use error::{ModelError, ModelResult};
pub use events::{topics, ChangeCause, ModelEvent, NodeValue};
pub use id_generator::IdGenerator;
pub use node::{Node, NodePatch, NodeRef, ParentRef};
pub use page::{InsertPosition, Page, EMPTY_PAGE_NAME};
pub use prop::{escape_segment, split_path, Prop, PropValue, Props, Slot, PATH_SEPARATOR};
pub use schema::{ComponentMeta, NodeSchema, PageSchema, PropKind, ROOT_CONTAINER};
