use std::fs;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use arboard::Clipboard;
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};
use holdclip::clips::ClipStore;
use holdclip::config_ext::ConfigExt;
use holdclip::controller::RecorderController;
use holdclip::event::AppEvent;
use holdclip::icon::MicState;
use holdclip::notify::{NotificationLayer, notify};
use holdclip::pipeline::ClipPipeline;
use holdclip::{
    APP_NAME, APP_NAME_PRETTY, ConfigManager, DEFAULT_LOG_LEVEL, GestureEvent, PermissionManager,
    PermissionState, PressGesture, VERSION,
};
use parking_lot::RwLock;
use tao::event::{Event, StartCause};
use tao::event_loop::{ControlFlow, EventLoop, EventLoopBuilder};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tray_icon::menu::{AboutMetadataBuilder, Menu, MenuEvent, MenuItem, PredefinedMenuItem};
use tray_icon::{TrayIconBuilder, TrayIconEvent};

fn main() -> Result<()> {
    // Initialize the logger
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("HOLDCLIP_LOG")
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL)),
        )
        .finish()
        .with(NotificationLayer::new())
        .init();

    // Load config
    let config_manager = ConfigManager::new()?;
    let config = Arc::new(RwLock::new(config_manager.load()?));
    // save back the config to create the file if it doesn't exist
    config_manager.save(&config.read())?;

    // Set up the push-to-talk hotkey
    let hotkey = config.hotkey();
    let hotkey_manager = GlobalHotKeyManager::new().context("Failed to create hotkey manager")?;
    hotkey_manager
        .register(hotkey)
        .context("Failed to register hotkey")?;

    // Clipboard interaction for the tray menu
    let mut clipboard = Clipboard::new()?;

    // Create the tray menu
    let tray_menu = Menu::new();
    let icon_quit = MenuItem::new("Quit", true, None);
    let icon_copy_config = MenuItem::new("Copy config path", true, None);
    let icon_save_clip = MenuItem::new("Save last clip", true, None);
    tray_menu.append_items(&[
        // the name of the app
        &MenuItem::new(APP_NAME_PRETTY, false, None),
        &PredefinedMenuItem::separator(),
        &PredefinedMenuItem::about(
            None,
            Some(
                AboutMetadataBuilder::new()
                    .version(Some(VERSION.to_owned()))
                    .build(),
            ),
        ),
        &icon_copy_config,
        &icon_save_clip,
        &PredefinedMenuItem::separator(),
        &icon_quit,
    ])?;

    // Set up the event loop
    let mut icon_tray = None;

    let menu_channel = MenuEvent::receiver();
    let tray_channel = TrayIconEvent::receiver();
    let hotkey_channel = GlobalHotKeyEvent::receiver();

    let event_loop: EventLoop<AppEvent> = EventLoopBuilder::with_user_event().build();
    let event_sender = event_loop.create_proxy();

    // Capture side: permission manager, finalize pipeline, controller
    let permissions = {
        let proxy = event_sender.clone();
        PermissionManager::new(config.read().input_device.clone()).with_on_change(move |state| {
            proxy.send_event(AppEvent::PermissionChanged(state)).ok();
        })
    };
    let pipeline = ClipPipeline::new(event_sender.clone())?;
    let mut controller = RecorderController::new(permissions, pipeline, event_sender.clone());

    // Press gesture detection and the clip registry
    let mut gesture = PressGesture::new();
    let mut clips = ClipStore::new();

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;

        match &event {
            Event::NewEvents(StartCause::Init) => {
                // We create the icon once the event loop is actually running
                // to prevent issues like https://github.com/tauri-apps/tray-icon/issues/90

                icon_tray.replace(
                    TrayIconBuilder::new()
                        .with_menu(Box::new(tray_menu.clone()))
                        .with_tooltip("holdclip - push to talk recorder")
                        .with_icon(MicState::Idle.icon())
                        .build()
                        .unwrap(),
                );

                // We have to request a redraw here to have the icon actually show up.
                // Tao only exposes a redraw method on the Window so we use core-foundation directly.
                #[cfg(target_os = "macos")]
                unsafe {
                    use core_foundation::runloop::{CFRunLoopGetMain, CFRunLoopWakeUp};

                    let rl = CFRunLoopGetMain();
                    CFRunLoopWakeUp(rl);
                }

                info!("Holdclip ready");
            }
            // The gesture timer wakeup: promote a sustained press to a hold.
            Event::NewEvents(StartCause::ResumeTimeReached { .. }) => {
                gesture.poll(Instant::now());
            }
            // Losing the session mid-press must not leave capture running.
            Event::Suspended => {
                gesture.cancel(Instant::now());
            }
            _ => {}
        }

        if let Ok(event) = menu_channel.try_recv() {
            if event.id == icon_quit.id() {
                icon_tray.take();
                *control_flow = ControlFlow::Exit;
            } else if event.id == icon_copy_config.id() {
                if let Err(e) =
                    clipboard.set_text(config_manager.config_path().to_string_lossy().into_owned())
                {
                    error!("Failed to copy config path to clipboard: {}", e);
                }
            } else if event.id == icon_save_clip.id() {
                save_current_clip(&clips);
            }
        }

        #[expect(clippy::redundant_pattern_matching)]
        if let Ok(_) = tray_channel.try_recv() {
            // Handle tray icon events
        }

        // Handle user provided events
        if let Event::UserEvent(event) = event {
            match event {
                AppEvent::IconChanged(state) => {
                    info!(state = ?state, "icon state changed");
                    icon_tray.as_ref().map(|i| i.set_icon(Some(state.icon())));
                }
                AppEvent::PermissionChanged(state) => {
                    info!(state = ?state, "permission state changed");
                    match state {
                        PermissionState::Denied => notify(
                            "microphone",
                            "Microphone access was denied. Allow access and press again.",
                        ),
                        PermissionState::NotFound => notify("microphone", "No microphone found."),
                        PermissionState::Granted | PermissionState::Prompt => {}
                    }
                }
                AppEvent::ClipReady(clip) => {
                    let duration = clip.duration();
                    let handle = clips.publish(clip);
                    info!(
                        uri = %handle.uri(),
                        duration_seconds = duration.as_secs_f64(),
                        "clip ready"
                    );
                    notify(
                        "clip ready",
                        &format!(
                            "Recorded {:.1}s. Save it from the tray menu.",
                            duration.as_secs_f64()
                        ),
                    );
                }
                AppEvent::AudioError(message) => {
                    warn!("Clip finalization failed: {}", message);
                }
            };
        }

        // Hotkey press and release feed the gesture detector
        if let Ok(event) = hotkey_channel.try_recv() {
            if event.id() == hotkey.id() {
                match event.state() {
                    HotKeyState::Pressed => gesture.press_down(Instant::now()),
                    HotKeyState::Released => gesture.press_up(Instant::now()),
                }
            }
        }

        // Drain edge-triggered gesture signals
        while let Some(signal) = gesture.next_event() {
            match signal {
                GestureEvent::LongPressStart => controller.start_recording(),
                GestureEvent::LongPressEnd => controller.stop_recording(),
                GestureEvent::ShortPress => {
                    info!("short press, nothing recorded");
                    if config.read().notify_hints {
                        notify("hint", "Press and hold to record.");
                    }
                }
            }
        }

        // Arm the next wakeup while a press is being timed
        if let Some(deadline) = gesture.deadline() {
            if !matches!(*control_flow, ControlFlow::Exit) {
                *control_flow = ControlFlow::WaitUntil(deadline);
            }
        }
    });
}

/// Write the current clip to the user's download directory. The registry
/// itself never touches disk; this runs only on an explicit menu action.
fn save_current_clip(clips: &ClipStore) {
    let Some(clip) = clips.current_clip() else {
        notify("clip", "Nothing recorded yet.");
        return;
    };
    let Some(dir) = dirs::download_dir().or_else(dirs::home_dir) else {
        warn!("No download directory available");
        return;
    };
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let path = dir.join(format!("{APP_NAME}-{stamp}.wav"));
    match fs::write(&path, clip.data()) {
        Ok(()) => {
            info!(path = %path.display(), "clip saved");
            notify("clip saved", &path.display().to_string());
        }
        Err(e) => error!("Failed to save clip: {}", e),
    }
}
