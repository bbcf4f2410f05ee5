// Entrypoint for the capture client.
// - Keeps `main` small: create the relay client and camera, hand them to
//   the UI loop.
// - Logs go to stderr and default to warnings so they do not interleave
//   with the prompts; set RUST_LOG=debug to trace requests.

use emotion_capture::{api::ApiClient, camera::CommandCamera, ui::main_menu};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    // Relay base URL from `RELAY_URL`, default http://localhost:3001.
    let api = ApiClient::from_env()?;
    // Capture command from `CAMERA_COMMAND`, default a one-frame ffmpeg grab.
    let camera = CommandCamera::from_env();

    // Start the interactive menu. This call blocks until the user exits.
    main_menu(api, &camera)?;
    Ok(())
}
