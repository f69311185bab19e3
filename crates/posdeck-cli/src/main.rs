//! Operator and diagnostic tool for posdeck terminal hardware.
//!
//! Every subcommand loads a hardware configuration (`--config`, JSON) and
//! drives the same facade the point-of-sale application uses. With
//! `--simulate` the printer and camera are replaced by mock devices so the
//! tool runs on machines without peripherals.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use posdeck_core::{DeviceKind, HardwareConfiguration};
use posdeck_escpos::ReceiptDocument;
use posdeck_hardware::capabilities::{CapabilitySet, NativeCapabilities};
use posdeck_hardware::mock::{MockCameraSource, MockQrDecoder, MockTransportHandle};
use posdeck_hardware::qr::{CameraSource, QrDecoder};
use posdeck_hardware::transport::list_serial_ports;
use posdeck_hardware::{HardwareFacade, PrintMedium};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "posdeck", version, about = "Point-of-sale hardware diagnostics")]
struct Cli {
    /// Hardware configuration file (JSON). Defaults to a human-readable printer only.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Use simulated printer and camera devices.
    #[arg(long, global = true)]
    simulate: bool,

    /// Log at debug level, overriding RUST_LOG.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the status of every device as JSON.
    Status,

    /// Print a receipt from a JSON file.
    Print {
        /// Receipt document (JSON).
        receipt: PathBuf,

        /// Write the rendered HTML here when the receipt is not printed on a device.
        #[arg(long)]
        fallback_out: Option<PathBuf>,
    },

    /// Open the cash drawer.
    Drawer,

    /// Exercise one device (printer, scanner, qr-reader, cash-drawer, touchscreen).
    Test { kind: DeviceKind },

    /// List serial ports available for a serial printer.
    Ports,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Command::Ports = cli.command {
        return list_ports();
    }

    let config = load_config(cli.config.as_deref())?;

    if cli.simulate {
        let printer = MockTransportHandle::new();
        let (camera, _camera_handle) = MockCameraSource::new();
        let facade = HardwareFacade::builder(config)
            .with_transport_factory(printer.factory())
            .with_camera(camera)
            .with_decoder(MockQrDecoder::new())
            .with_capabilities(CapabilitySet::all())
            .build()?;

        let code = execute(&facade, cli.command).await;
        debug!(
            bytes = printer.sent_bytes().len(),
            "Simulated printer received data"
        );
        code
    } else {
        let facade = HardwareFacade::builder(config)
            .with_capabilities(NativeCapabilities::new(false, false))
            .build()?;
        execute(&facade, cli.command).await
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<HardwareConfiguration> {
    match path {
        Some(path) => HardwareConfiguration::from_json_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => {
            info!("No configuration given, using human-readable printer");
            Ok(HardwareConfiguration::human_readable_only())
        }
    }
}

async fn execute<C: CameraSource, D: QrDecoder>(
    facade: &HardwareFacade<C, D>,
    command: Command,
) -> Result<ExitCode> {
    let code = match command {
        Command::Status => {
            let snapshot = facade.check_all().await;
            println!("{}", serde_json::to_string_pretty(&*snapshot)?);
            ExitCode::SUCCESS
        }
        Command::Print {
            receipt,
            fallback_out,
        } => print_receipt(facade, &receipt, fallback_out.as_deref()).await?,
        Command::Drawer => match facade.open_cash_drawer().await {
            Ok(()) => {
                println!("Cash drawer opened");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Cash drawer failed: {e}");
                ExitCode::FAILURE
            }
        },
        Command::Test { kind } => {
            let result = facade.test_device(kind).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
            if result.success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Command::Ports => list_ports()?,
    };

    facade.shutdown().await;
    Ok(code)
}

async fn print_receipt<C: CameraSource, D: QrDecoder>(
    facade: &HardwareFacade<C, D>,
    receipt: &Path,
    fallback_out: Option<&Path>,
) -> Result<ExitCode> {
    let json = std::fs::read_to_string(receipt)
        .with_context(|| format!("Failed to read {}", receipt.display()))?;
    let doc: ReceiptDocument = serde_json::from_str(&json)
        .with_context(|| format!("Invalid receipt in {}", receipt.display()))?;

    let outcome = facade.print_receipt(&doc).await;
    match &outcome.medium {
        PrintMedium::Device => println!("Receipt {} printed", doc.receipt_number),
        PrintMedium::HumanReadable => {
            println!("Receipt {} rendered for printing", doc.receipt_number)
        }
        PrintMedium::Fallback { reason } => {
            println!("Printer unavailable ({reason}), receipt rendered instead")
        }
    }

    if let (Some(path), Some(rendered)) = (fallback_out, &outcome.rendered) {
        std::fs::write(path, rendered.to_html())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Rendered receipt written to {}", path.display());
    } else if let Some(rendered) = &outcome.rendered {
        print!("{}", rendered.to_text());
    }

    Ok(ExitCode::SUCCESS)
}

fn list_ports() -> Result<ExitCode> {
    let ports = list_serial_ports().context("Serial port discovery failed")?;
    println!("{}", serde_json::to_string_pretty(&ports)?);
    Ok(ExitCode::SUCCESS)
}
