use inpaint_mask_core::{
    config::Config,
    init,
    open_image,
    request::InpaintRequest,
    settings::{Settings, AVAILABLE_MODELS},
    EditorSession,
    StrokeScript,
};
use anyhow::{bail, Context, Result};
use arboard::Clipboard;
use clap::Parser;
use std::fs;
use std::io;
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Photo to paint the selection on
    #[arg(required_unless_present = "list_models")]
    image: Option<PathBuf>,

    /// Prompt describing what to generate in the selected area
    #[arg(trailing_var_arg = true)]
    prompt: Vec<String>,

    /// Recorded brush strokes (JSON)
    #[arg(short, long, required_unless_present = "list_models")]
    strokes: Option<PathBuf>,

    /// Where to write the exported mask
    #[arg(long, default_value = "mask.png")]
    mask: PathBuf,

    /// Write the composited canvas (photo + selection) here
    #[arg(long)]
    preview: Option<PathBuf>,

    /// Write the inpainting request body (JSON) here
    #[arg(long)]
    request: Option<PathBuf>,

    /// Override the model defined in settings or .env
    #[arg(short, long)]
    model: Option<String>,

    /// Elements to avoid in the generation
    #[arg(long)]
    negative_prompt: Option<String>,

    /// Generation seed (-1 for random)
    #[arg(long, allow_negative_numbers = true)]
    seed: Option<i64>,

    /// Sampling steps
    #[arg(long)]
    steps: Option<u32>,

    /// Classifier-free guidance scale
    #[arg(long)]
    cfg: Option<f32>,

    /// Override the canvas container width
    #[arg(long)]
    container_width: Option<f32>,

    /// Override the canvas container height
    #[arg(long)]
    container_height: Option<f32>,

    /// Persist the effective generation parameters as the new defaults
    #[arg(long, default_value_t = false)]
    save_settings: bool,

    /// Copy the Base64 mask to clipboard
    #[arg(short, long, default_value_t = false)]
    copy: bool,

    /// List available models and exit
    #[arg(long)]
    list_models: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup
    init();
    env_logger::init();
    let args = Args::parse();

    // Handle --list-models
    if args.list_models {
        println!("Available models:");
        for model in AVAILABLE_MODELS {
            println!("{}", model);
        }
        return Ok(());
    }

    // Load config and apply CLI overrides
    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(width) = args.container_width {
        config.container.width = width;
    }
    if let Some(height) = args.container_height {
        config.container.height = height;
    }

    let mut settings = Settings::load(&config.model_name);
    if let Some(m) = args.model {
        settings.params.ckpt_name = m;
    }
    if let Some(negative) = args.negative_prompt {
        settings.params.negative_prompt = negative;
    }
    if let Some(seed) = args.seed {
        settings.params.seed = seed;
    }
    if let Some(steps) = args.steps {
        settings.params.steps = steps;
    }
    if let Some(cfg) = args.cfg {
        settings.params.cfg = cfg;
    }
    settings.params.validate().context("Invalid generation parameters")?;

    if args.save_settings {
        settings.save().context("Failed to save settings")?;
        println!("(Settings saved)");
    }

    // Load inputs
    let image_path = args.image.context("No image given")?;
    let strokes_path = args.strokes.context("No strokes file given")?;
    let image = open_image(&image_path).context("Failed to load image")?;
    let script = StrokeScript::from_path(&strokes_path)
        .with_context(|| format!("Failed to read strokes from {}", strokes_path.display()))?;

    // Paint
    let mut session = EditorSession::from_settings(&config, &settings);
    session.load_image(image);
    if !session.is_laid_out() {
        bail!(
            "Container {}x{} has no usable size. Try --container-width/--container-height",
            config.container.width,
            config.container.height
        );
    }
    session.replay(&script);

    if let Some(preview) = &args.preview {
        session
            .render()
            .context("Failed to composite preview")?
            .save(preview)
            .with_context(|| format!("Failed to write preview to {}", preview.display()))?;
        println!("Preview written to {}", preview.display());
    }

    // Export
    let mask = session
        .export_mask_async()
        .await
        .context("Failed to export mask")?;
    mask.save_png(&args.mask)
        .with_context(|| format!("Failed to write mask to {}", args.mask.display()))?;
    println!(
        "Mask {}x{} written to {} ({} pixels to regenerate)",
        mask.width(),
        mask.height(),
        args.mask.display(),
        mask.regenerate_count()
    );

    if let Some(request_path) = &args.request {
        // If prompt was empty, ask now
        let mut prompt_text = args.prompt.join(" ");
        if prompt_text.trim().is_empty() {
            print!("Enter prompt: ");
            io::stdout().flush()?;
            let mut input = String::new();
            io::stdin().read_line(&mut input)?;
            prompt_text = input.trim().to_string();
        }

        let original = session.original().context("No image loaded")?;
        let request = InpaintRequest::new(&prompt_text, settings.params.clone(), original, &mask)
            .context("Failed to build inpainting request")?;
        fs::write(request_path, request.to_json()?)
            .with_context(|| format!("Failed to write request to {}", request_path.display()))?;
        println!("Request written to {}", request_path.display());
    }

    // Copy to clipboard if requested
    if args.copy {
        let encoded = mask.to_base64_png()?;
        match Clipboard::new() {
            Ok(mut clipboard) => {
                if let Err(e) = clipboard.set_text(encoded) {
                    eprintln!("Warning: Failed to copy to clipboard: {}", e);
                } else {
                    println!("(Copied to clipboard)");
                }
            }
            Err(e) => eprintln!("Warning: Could not access clipboard: {}", e),
        }
    }

    Ok(())
}
