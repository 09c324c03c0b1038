//! # TUI Components
//!
//! ## Component Architecture
//!
//! ### Stateless Components (Props-Based Rendering)
//!
//! - `TitleBar`: room, connection indicator, message count, status line
//! - `MessageView`: a single chat message
//!
//! ### Stateful Components (Event-Driven)
//!
//! - `InputBox`: single-line composer
//! - `MessageList`: scrollable message view that follows new content
//! - `RoomPicker`: conversation directory overlay
//!
//! Each component file holds its state types, event types, rendering and
//! tests. Components receive data as props rather than reaching into the
//! session, so they can be rendered against a `TestBackend` in isolation.
//!
//! ```text
//! components/
//! ├── mod.rs           (this file)
//! ├── title_bar.rs     (Top status bar)
//! ├── message.rs       (Single message renderer)
//! ├── message_list.rs  (Scrollable message container)
//! ├── input_box.rs     (Composer)
//! └── room_picker.rs   (Room list overlay)
//! ```

pub mod input_box;
pub mod message;
pub mod message_list;
pub mod room_picker;
pub mod title_bar;

pub use input_box::{InputBox, InputEvent};
pub use message_list::{MessageList, MessageListState};
pub use room_picker::{DirectorySnapshot, RoomPicker, RoomPickerEvent, RoomPickerState};
pub use title_bar::{StatusIndicator, TitleBar};
