use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Parser;

use panelkit::cli::CliArgs;
use panelkit::config::PanelKitConfig;
use panelkit::geometry::{Point, Rect};
use panelkit::panel::headless::{HeadlessWindow, TransitionMode};
use panelkit::panel::{
    BackgroundImage, FloatingStyle, ImmersiveStyle, PanelController, PanelWindow,
};
use panelkit::wallpaper::{
    DesktopSource, StaticDesktop, Thumbnail, WallpaperService, WallpaperWatcher,
};

/// Slack on top of a transition's duration before a cycle is reported stuck
const SETTLE_GRACE: Duration = Duration::from_secs(2);

/// Upper bound for decoding every wallpaper on startup
const WARMUP_TIMEOUT: Duration = Duration::from_secs(30);

fn main() -> Result<()> {
    let args = CliArgs::parse();
    panelkit::tracing::init("warn");

    let config = args.resolve_config();
    tracing::debug!(?config, "resolved configuration");

    let mut background = BackgroundImage::new(None);
    if !args.wallpapers.is_empty() {
        warm_wallpapers(&args, &config, &mut background)?;
    }

    run_cycles(&args, &config)?;
    Ok(())
}

fn run_cycles(args: &CliArgs, config: &PanelKitConfig) -> Result<()> {
    let screen = Rect::from_origin_size(Point::ZERO, args.screen);
    let window = HeadlessWindow::new(screen)
        .with_content_size(args.content)
        .with_mode(TransitionMode::Timed);

    let mut controller = if args.immersive {
        let style = ImmersiveStyle::with_timing(config.enter, config.exit);
        PanelController::with_style(window, &style)
    } else {
        let style = FloatingStyle {
            sizing: args.sizing,
            position: args.position,
            presentation: config.presentation(),
        };
        PanelController::with_style(window, &style)
    };

    let enter_timeout = config.enter.duration + SETTLE_GRACE;
    let exit_timeout = config.exit.duration + SETTLE_GRACE;

    for cycle in 1..=args.cycles {
        let started = Instant::now();

        if !controller.present().context("present failed")? {
            bail!("cycle {}: present rejected in state {}", cycle, controller.state());
        }
        if !controller.wait_until_settled(enter_timeout) {
            bail!("cycle {}: enter transition did not settle", cycle);
        }
        let frame = controller.window().frame();
        println!("cycle {}: {} at {}", cycle, controller.state(), frame);

        controller.actions().dismiss();
        controller.process_events();
        if !controller.wait_until_settled(exit_timeout) {
            bail!("cycle {}: exit transition did not settle", cycle);
        }
        println!(
            "cycle {}: {} after {:?}",
            cycle,
            controller.state(),
            started.elapsed()
        );
    }

    tracing::info!(cycles = args.cycles, "simulation finished");
    Ok(())
}

fn warm_wallpapers(
    args: &CliArgs,
    config: &PanelKitConfig,
    background: &mut BackgroundImage<Thumbnail>,
) -> Result<()> {
    let paths = args.wallpapers.clone();
    let desktop = StaticDesktop::new(paths.clone());
    let mut service = WallpaperService::from_config(desktop, config);

    let started = service.refresh();
    tracing::info!(started, "loading wallpapers");
    if !service.wait_idle(WARMUP_TIMEOUT) {
        bail!("wallpapers did not finish loading in {:?}", WARMUP_TIMEOUT);
    }
    report_wallpapers(&mut service, &paths, background);

    if let Some(secs) = args.watch {
        watch_wallpapers(&mut service, config, Duration::from_secs(secs), background)?;
    }
    Ok(())
}

fn report_wallpapers(
    service: &mut WallpaperService<StaticDesktop>,
    paths: &[PathBuf],
    background: &mut BackgroundImage<Thumbnail>,
) {
    let loaded = service.current_wallpapers();
    for path in paths {
        match loaded.iter().find(|(p, _)| p == path) {
            Some((_, thumb)) => println!(
                "{}: {} {}x{} -> {}x{} ({} bytes)",
                path.display(),
                thumb.format,
                thumb.source_width,
                thumb.source_height,
                thumb.width,
                thumb.height,
                thumb.byte_len()
            ),
            None => println!("{}: not loaded", path.display()),
        }
    }

    let first = loaded.first().map(|(_, thumb)| Arc::clone(thumb));
    if background.update(first) {
        tracing::debug!("panel background updated");
    }
}

fn watch_wallpapers(
    service: &mut WallpaperService<StaticDesktop>,
    config: &PanelKitConfig,
    duration: Duration,
    background: &mut BackgroundImage<Thumbnail>,
) -> Result<()> {
    let paths = service.source().wallpaper_paths();
    let watcher = WallpaperWatcher::new(&paths, config.watch_debounce())
        .context("failed to watch wallpapers")?;
    println!("watching {} wallpapers for {:?}", paths.len(), duration);

    let deadline = Instant::now() + duration;
    while Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(100));

        let events = watcher.poll_events();
        if events.is_empty() {
            service.poll();
            continue;
        }

        for event in &events {
            println!("changed: {}", event.path().display());
        }
        service.apply_invalidations(&events);
        if service.wait_idle(WARMUP_TIMEOUT) {
            report_wallpapers(service, &paths, background);
        }
    }
    Ok(())
}
