// Library root
// -----------
// This crate exposes the pieces of both programs: the terminal capture
// client (`main.rs`) and the relay server (`bin/relay.rs`).
//
// Module responsibilities:
// - `selection`: The selected image, its `data:` URL preview and the
//   multipart payload built from it.
// - `camera`: Still frame acquisition through an external capture command.
// - `capture`: The acquire -> preview -> submit -> result state machine.
// - `api`: Blocking HTTP client for the relay endpoint.
// - `results`: The results view and the location that carries a result.
// - `ui`: Terminal flows on top of `capture`.
// - `relay`: The axum service that forwards images to the inference API.
//
// Keeping the state machine out of `ui` makes the workflow testable
// without a terminal.
pub mod api;
pub mod camera;
pub mod capture;
pub mod relay;
pub mod results;
pub mod selection;
pub mod ui;
