use clap::{Args, Parser, Subcommand};
use vista_engine::OverlayKind;
use vista_engine::config::{API_BASE_URL_ENV, DEFAULT_API_BASE_URL};

/// Define CLI arguments
#[derive(Parser, Debug)]
#[command(
    name = "vista",
    version,
    about = "Live RTSP stream viewer with overlay management",
    long_about = "Starts RTSP-to-HLS transcoding sessions on the Vista backend, verifies the\n\
                  resulting HLS stream and manages the overlays rendered on top of it."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true, help = "Enable detailed debug logging")]
    pub verbose: bool,

    /// Base URL of the backend API
    #[arg(
        long,
        global = true,
        env = API_BASE_URL_ENV,
        default_value = DEFAULT_API_BASE_URL,
        help = "Base URL of the backend API"
    )]
    pub api_base_url: String,

    /// Request timeout in seconds
    #[arg(
        long,
        global = true,
        default_value = "15",
        help = "Overall timeout in seconds for backend API requests"
    )]
    pub timeout: u64,

    /// Stream start timeout in seconds
    #[arg(
        long,
        global = true,
        default_value = "45",
        help = "Maximum time in seconds to wait for the backend to start a stream"
    )]
    pub start_timeout: u64,

    /// Attach timeout in seconds
    #[arg(
        long,
        global = true,
        default_value = "20",
        help = "Maximum time in seconds to wait for the HLS playlist to become available"
    )]
    pub attach_timeout: u64,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start a stream and keep it running until Ctrl-C
    Stream {
        /// RTSP source URL
        source_url: String,

        #[command(flatten)]
        surface: SurfaceArgs,
    },

    /// Read source URLs from stdin and restart the stream for each settled value
    Watch {
        /// Settle period in milliseconds
        #[arg(long, default_value = "500")]
        debounce_ms: u64,

        #[command(flatten)]
        surface: SurfaceArgs,
    },

    /// Manage overlays
    Overlays {
        #[command(subcommand)]
        action: OverlayAction,
    },

    /// Print the overlay layers composed for a surface size
    Compose {
        #[command(flatten)]
        surface: SurfaceArgs,
    },
}

#[derive(Args, Debug, Clone, Copy)]
pub struct SurfaceArgs {
    /// Surface width in pixels
    #[arg(long, default_value = "1280")]
    pub width: u32,

    /// Surface height in pixels
    #[arg(long, default_value = "720")]
    pub height: u32,
}

#[derive(Subcommand, Debug)]
pub enum OverlayAction {
    /// List all overlays
    List,

    /// Create an overlay
    Create {
        #[command(flatten)]
        fields: OverlayFields,
    },

    /// Update an existing overlay, keeping fields that are not given
    Update {
        /// Overlay id
        id: String,

        #[command(flatten)]
        fields: OverlayFields,
    },

    /// Delete an overlay
    Delete {
        /// Overlay id
        id: String,
    },
}

#[derive(Args, Debug, Default)]
pub struct OverlayFields {
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long = "type", value_enum)]
    pub kind: Option<OverlayKind>,

    /// Text to display, or image URL / base64 data for logos
    #[arg(long)]
    pub content: Option<String>,

    /// Text color (text overlays only)
    #[arg(long)]
    pub color: Option<String>,

    #[arg(long)]
    pub x: Option<i64>,

    #[arg(long)]
    pub y: Option<i64>,

    #[arg(long)]
    pub width: Option<i64>,

    #[arg(long)]
    pub height: Option<i64>,
}
