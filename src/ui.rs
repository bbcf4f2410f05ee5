// UI layer: an interactive menu using `dialoguer` on top of the capture
// session. Each screen renders one session state and applies the user's
// choice; the loop ends when the user picks "Exit".

use crate::api::{ApiClient, SubmitError};
use crate::camera::Camera;
use crate::capture::{CaptureSession, CaptureState};
use crate::results::{render, result_from_location};
use crate::selection::{ImageSource, SelectedImage};
use anyhow::Result;
use crossterm::style::Stylize;
use dialoguer::{Confirm, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

/// Extensions offered by the file picker.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp", "tif", "tiff"];

/// Characters of the preview `data:` URL shown on the preview screen.
const PREVIEW_CHARS: usize = 48;

enum Flow {
    Continue,
    Exit,
}

/// Main interactive loop. Receives the relay client and a camera and runs
/// until the user chooses "Exit".
pub fn main_menu(api: ApiClient, camera: &dyn Camera) -> Result<()> {
    println!("{}", "Image Capture".bold());
    println!("Upload an image from your device or capture one with your camera");
    println!("Relay: {}\n", api.base_url());

    let mut session = CaptureSession::new();
    loop {
        let flow = match session.state().clone() {
            CaptureState::Acquiring { tab } => acquire_screen(&mut session, tab, camera)?,
            CaptureState::Previewing { image, error } => {
                preview_screen(&mut session, &api, &image, error.as_deref())?
            }
            CaptureState::Result { location, .. } => result_screen(&mut session, &location)?,
            // submissions complete before the loop comes back around
            CaptureState::Submitting { .. } => Flow::Continue,
        };
        if let Flow::Exit = flow {
            break;
        }
    }
    Ok(())
}

/// Source tabs plus the actions of the active tab.
fn acquire_screen(
    session: &mut CaptureSession,
    tab: ImageSource,
    camera: &dyn Camera,
) -> Result<Flow> {
    let other = match tab {
        ImageSource::Upload => ImageSource::Camera,
        ImageSource::Camera => ImageSource::Upload,
    };
    let actions: &[&str] = match tab {
        ImageSource::Upload => &["Choose file...", "Enter file path"],
        ImageSource::Camera => &["Capture photo"],
    };
    println!(
        "Select Image Source: {} | {}",
        format!("[{}]", tab.label()).bold(),
        other.label()
    );

    let switch = format!("Switch to {}", other.label());
    let mut items: Vec<&str> = actions.to_vec();
    items.push(&switch);
    items.push("Exit");

    let selection = Select::new().items(&items).default(0).interact()?;
    match items[selection] {
        "Choose file..." => {
            if let Some(path) = pick_file() {
                load(session, path);
            } else {
                println!("No file chosen.");
            }
        }
        "Enter file path" => {
            let path: String = Input::new().with_prompt("Image file path").interact_text()?;
            load(session, PathBuf::from(path.trim()));
        }
        "Capture photo" => capture(session, camera)?,
        "Exit" => return Ok(Flow::Exit),
        _ => session.select_tab(other),
    }
    Ok(Flow::Continue)
}

/// Native file picker, starting in the user's pictures directory.
fn pick_file() -> Option<PathBuf> {
    let start = dirs::picture_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."));
    rfd::FileDialog::new()
        .add_filter("Images", IMAGE_EXTENSIONS)
        .set_directory(start)
        .pick_file()
}

fn load(session: &mut CaptureSession, path: PathBuf) {
    if let Err(e) = session.load_upload(&path) {
        println!("{}", e.to_string().red());
    }
}

fn capture(session: &mut CaptureSession, camera: &dyn Camera) -> Result<()> {
    let spinner = spinner("Capturing...")?;
    let captured = session.capture(camera);
    spinner.finish_and_clear();
    match captured {
        Ok(true) => {}
        Ok(false) => println!(
            "{}",
            "No camera frame available. Check the device or set CAMERA_COMMAND.".yellow()
        ),
        Err(e) => println!("{}", e.to_string().red()),
    }
    Ok(())
}

fn preview_screen(
    session: &mut CaptureSession,
    api: &ApiClient,
    image: &SelectedImage,
    error: Option<&str>,
) -> Result<Flow> {
    let shown: String = image.preview().chars().take(PREVIEW_CHARS).collect();
    println!("Selected image ({}): {}...", image.source().label(), shown);
    match error {
        Some(message) => println!("{}", message.red()),
        None => println!(
            "{}",
            "✅ Image selected successfully! Choose \"Continue\" to proceed.".green()
        ),
    }

    let items = ["Continue", "Choose different image", "Exit"];
    let selection = Select::new().items(&items).default(0).interact()?;
    match selection {
        0 => {
            // the spinner ticks on its own thread while the request runs
            let spinner = spinner("Detecting emotion...")?;
            let outcome = session.submit(api);
            spinner.finish_and_clear();
            // failures kept in the session are shown by the preview screen
            if let Err(e) = outcome {
                if !holds_error(session, &e) {
                    println!("{}", e.to_string().red());
                }
            }
        }
        1 => session.reset(),
        _ => return Ok(Flow::Exit),
    }
    Ok(Flow::Continue)
}

/// Whether the session already carries `err` for the preview screen.
fn holds_error(session: &CaptureSession, err: &SubmitError) -> bool {
    match session.state() {
        CaptureState::Previewing {
            error: Some(message),
            ..
        } => *message == err.to_string(),
        _ => false,
    }
}

/// Results view. The result is read back from the location it was sent to.
fn result_screen(session: &mut CaptureSession, location: &str) -> Result<Flow> {
    let result = result_from_location(location);
    println!("\n{}", render(result.as_ref()));

    if Confirm::new()
        .with_prompt("Analyze another image?")
        .default(true)
        .interact()?
    {
        session.reset();
        Ok(Flow::Continue)
    } else {
        Ok(Flow::Exit)
    }
}

fn spinner(message: &'static str) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    Ok(spinner)
}
