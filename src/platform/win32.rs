//! Win32 overlay window
//!
//! A layered, topmost tool-window popup painted with GDI. All window state
//! lives in a [`WindowContext`] behind a global lock. Handlers take what
//! they need under the lock, release it, and only then make Win32 calls
//! that can re-enter the window procedure (show/hide, destroy).

use crate::config::OverlayConfig;
use crate::error::OverlayError;
use crate::gesture::{self, CursorInput, GestureSettings};
use crate::hotkey::Hotkey;
use crate::metrics::{MetricsCollector, MetricsSources};
use crate::overlay::{render, CommandDispatcher, Frame, Overlay, OverlayCommand, Visibility};
use crate::position::{self, Position, PositionStore};
use crossbeam::channel::Receiver;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use windows::core::w;
use windows::Win32::Foundation::{COLORREF, HWND, LPARAM, LRESULT, RECT, WPARAM};
use windows::Win32::Graphics::Gdi::{
    BeginPaint, CreateSolidBrush, DeleteObject, DrawTextW, EndPaint, FillRect, GetStockObject,
    InvalidateRect, SelectObject, SetBkMode, SetTextColor, DEFAULT_GUI_FONT, DT_LEFT,
    DT_NOPREFIX, DT_TOP, DT_WORDBREAK, PAINTSTRUCT, TRANSPARENT,
};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::HiDpi::{
    SetProcessDpiAwarenessContext, DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2,
};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    RegisterHotKey, UnregisterHotKey, HOT_KEY_MODIFIERS,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW, GetClientRect, GetMessageW,
    GetWindowRect, KillTimer, LoadCursorW, PostMessageW, PostQuitMessage, RegisterClassExW,
    SetLayeredWindowAttributes, SetTimer, SetWindowPos, ShowWindow, TranslateMessage, CS_HREDRAW,
    CS_VREDRAW, HMENU, HWND_TOPMOST, IDC_ARROW, LWA_ALPHA, MSG, SWP_NOACTIVATE, SWP_NOMOVE,
    SWP_NOSIZE, SW_HIDE, SW_SHOWNOACTIVATE, WM_APP, WM_CLOSE, WM_DESTROY, WM_ENDSESSION,
    WM_ERASEBKGND, WM_HOTKEY, WM_PAINT, WM_TIMER, WNDCLASSEXW, WS_EX_LAYERED, WS_EX_TOOLWINDOW,
    WS_EX_TOPMOST, WS_POPUP,
};

const REFRESH_TIMER_ID: usize = 1;
const HOTKEY_ID: i32 = 1;
/// Posted by the gesture thread after queueing a command
const WM_APP_WAKE: u32 = WM_APP + 1;
const TEXT_MARGIN: i32 = 10;
const CREDIT_GAP: i32 = 4;

struct WindowContext {
    overlay: Overlay,
    commands: Receiver<OverlayCommand>,
    store: Option<Box<dyn PositionStore>>,
    hotkey_registered: bool,
    reassert_topmost: bool,
}

/// Window state, owned by the UI thread
static CONTEXT: OnceLock<Mutex<Option<WindowContext>>> = OnceLock::new();

fn with_context<R>(f: impl FnOnce(&mut WindowContext) -> R) -> Option<R> {
    let mut guard = CONTEXT.get()?.lock();
    guard.as_mut().map(f)
}

pub fn run(config: OverlayConfig, data_dir: Option<PathBuf>) -> Result<(), OverlayError> {
    unsafe {
        let _ = SetProcessDpiAwarenessContext(DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2);
    }

    let store = position::store_for(&config.position, data_dir.as_deref());
    let start_position = store.as_deref().map_or(config.default_position, |store| {
        position::load_or_default(store, config.default_position)
    });

    let collector = MetricsCollector::new(MetricsSources::platform(&config));
    let mut overlay = Overlay::new(&config, start_position, collector, Instant::now());
    overlay.refresh_metrics();

    let hwnd = unsafe { create_window(&config, start_position)? };
    info!(
        "Overlay window created at ({}, {})",
        start_position.x, start_position.y
    );

    // HWND is not Send; carry the raw value across to the gesture thread
    let raw_hwnd = hwnd.0 as isize;
    let (dispatcher, commands) = CommandDispatcher::channel(move || unsafe {
        let _ = PostMessageW(HWND(raw_hwnd as *mut _), WM_APP_WAKE, WPARAM(0), LPARAM(0));
    });

    let hotkey_registered = unsafe { register_hotkey(hwnd, &config.hotkey) };

    if config.gesture.enabled {
        let settings = GestureSettings::from(&config.gesture);
        if let Err(e) =
            gesture::spawn_detector(CursorInput, settings, overlay.visibility_flag(), dispatcher)
        {
            error!("Failed to start gesture detector: {}", e);
        }
    } else {
        debug!("Edge-drag gesture disabled");
    }

    let visibility = overlay.visibility();
    *CONTEXT.get_or_init(|| Mutex::new(None)).lock() = Some(WindowContext {
        overlay,
        commands,
        store,
        hotkey_registered,
        reassert_topmost: config.reassert_topmost,
    });

    unsafe {
        let _ = SetLayeredWindowAttributes(hwnd, COLORREF(0), config.alpha(), LWA_ALPHA);
        apply_visibility(hwnd, visibility, config.reassert_topmost);
        SetTimer(hwnd, REFRESH_TIMER_ID, config.refresh_timer_ms(), None);

        message_loop();
    }

    if let Some(context) = CONTEXT.get() {
        context.lock().take();
    }
    info!("Overlay window closed");
    Ok(())
}

unsafe fn create_window(config: &OverlayConfig, position: Position) -> Result<HWND, OverlayError> {
    let class_name = w!("BatteryOverlayWindow");

    let hinstance =
        GetModuleHandleW(None).map_err(|e| OverlayError::WindowClass(e.to_string()))?;

    let wcex = WNDCLASSEXW {
        cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
        style: CS_HREDRAW | CS_VREDRAW,
        lpfnWndProc: Some(wnd_proc),
        hInstance: hinstance.into(),
        hCursor: LoadCursorW(None, IDC_ARROW).unwrap_or_default(),
        lpszClassName: class_name,
        ..Default::default()
    };

    if RegisterClassExW(&wcex) == 0 {
        return Err(OverlayError::WindowClass(
            windows::core::Error::from_win32().to_string(),
        ));
    }

    CreateWindowExW(
        WS_EX_LAYERED | WS_EX_TOPMOST | WS_EX_TOOLWINDOW,
        class_name,
        w!("Battery Overlay"),
        WS_POPUP,
        position.x,
        position.y,
        config.size.width,
        config.size.height,
        None,
        HMENU::default(),
        hinstance,
        None,
    )
    .map_err(|e| OverlayError::WindowCreation(e.to_string()))
}

unsafe fn register_hotkey(hwnd: HWND, combo: &str) -> bool {
    let hotkey = match Hotkey::parse(combo) {
        Ok(hotkey) => hotkey,
        Err(e) => {
            warn!("Invalid hotkey {:?}: {}", combo, e);
            return false;
        }
    };
    if !hotkey.modifiers.any() {
        warn!("Hotkey {} has no modifier and will capture the key system-wide", hotkey);
    }

    match RegisterHotKey(
        hwnd,
        HOTKEY_ID,
        HOT_KEY_MODIFIERS(hotkey.modifier_flags()),
        hotkey.virtual_key(),
    ) {
        Ok(()) => {
            info!("Registered hotkey {}", hotkey);
            true
        }
        Err(e) => {
            warn!("Failed to register hotkey {}: {}", hotkey, e);
            false
        }
    }
}

/// Run the Windows message loop until WM_QUIT
unsafe fn message_loop() {
    let mut msg = MSG::default();

    loop {
        match GetMessageW(&mut msg, HWND::default(), 0, 0).0 {
            -1 => {
                error!("GetMessage error");
                break;
            }
            0 => {
                debug!("WM_QUIT received");
                break;
            }
            _ => {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
        }
    }
}

unsafe fn apply_visibility(hwnd: HWND, visibility: Visibility, reassert_topmost: bool) {
    match visibility {
        Visibility::Visible => {
            let _ = ShowWindow(hwnd, SW_SHOWNOACTIVATE);
            if reassert_topmost {
                let _ = SetWindowPos(
                    hwnd,
                    HWND_TOPMOST,
                    0,
                    0,
                    0,
                    0,
                    SWP_NOMOVE | SWP_NOSIZE | SWP_NOACTIVATE,
                );
            }
            let _ = InvalidateRect(hwnd, None, false);
        }
        Visibility::Hidden => {
            let _ = ShowWindow(hwnd, SW_HIDE);
        }
    }
}

/// Apply every command the gesture thread queued since the last wake-up
unsafe fn drain_commands(hwnd: HWND) {
    let latest = with_context(|ctx| {
        ctx.commands
            .try_iter()
            .map(|command| ctx.overlay.handle_command(command))
            .last()
            .map(|visibility| (visibility, ctx.reassert_topmost))
    })
    .flatten();

    if let Some((visibility, topmost)) = latest {
        apply_visibility(hwnd, visibility, topmost);
    }
}

unsafe fn paint(hwnd: HWND, frame: &Frame) {
    let mut ps = PAINTSTRUCT::default();
    let hdc = BeginPaint(hwnd, &mut ps);

    let mut rect = RECT::default();
    let _ = GetClientRect(hwnd, &mut rect);

    let brush = CreateSolidBrush(COLORREF(render::to_colorref(frame.background)));
    FillRect(hdc, &rect, brush);
    let _ = DeleteObject(brush);

    let old_font = SelectObject(hdc, GetStockObject(DEFAULT_GUI_FONT));
    SetBkMode(hdc, TRANSPARENT);
    SetTextColor(hdc, COLORREF(render::to_colorref(frame.text_color)));

    let mut text_rect = RECT {
        left: rect.left + TEXT_MARGIN,
        top: rect.top + TEXT_MARGIN,
        right: rect.right - TEXT_MARGIN,
        bottom: rect.bottom - TEXT_MARGIN,
    };
    let mut text: Vec<u16> = frame.text.encode_utf16().collect();
    let height = DrawTextW(hdc, &mut text, &mut text_rect, DT_LEFT | DT_TOP | DT_NOPREFIX);

    if let Some(credit) = &frame.credit {
        SetTextColor(hdc, COLORREF(render::to_colorref(render::CREDIT_TEXT)));
        text_rect.top += height + CREDIT_GAP;
        let mut credit: Vec<u16> = credit.encode_utf16().collect();
        DrawTextW(
            hdc,
            &mut credit,
            &mut text_rect,
            DT_LEFT | DT_TOP | DT_NOPREFIX | DT_WORDBREAK,
        );
    }

    SelectObject(hdc, old_font);
    let _ = EndPaint(hwnd, &ps);
}

/// Persist position, release the hotkey and timer, destroy the window
unsafe fn close(hwnd: HWND) {
    let mut rect = RECT::default();
    let position = GetWindowRect(hwnd, &mut rect).ok().map(|_| Position {
        x: rect.left,
        y: rect.top,
    });

    let hotkey_registered = with_context(|ctx| {
        if let Some(position) = position {
            ctx.overlay.set_position(position);
        }
        ctx.overlay.handle_close(ctx.store.as_deref());
        std::mem::take(&mut ctx.hotkey_registered)
    })
    .unwrap_or(false);

    if hotkey_registered {
        let _ = UnregisterHotKey(hwnd, HOTKEY_ID);
    }
    let _ = KillTimer(hwnd, REFRESH_TIMER_ID);
    let _ = DestroyWindow(hwnd);
}

unsafe extern "system" fn wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_TIMER if wparam.0 == REFRESH_TIMER_ID => {
            if with_context(|ctx| ctx.overlay.refresh_metrics()).unwrap_or(false) {
                let _ = InvalidateRect(hwnd, None, false);
            }
            LRESULT(0)
        }
        WM_HOTKEY if wparam.0 == HOTKEY_ID as usize => {
            if let Some((visibility, topmost)) =
                with_context(|ctx| (ctx.overlay.handle_hotkey(), ctx.reassert_topmost))
            {
                apply_visibility(hwnd, visibility, topmost);
            }
            LRESULT(0)
        }
        WM_APP_WAKE => {
            drain_commands(hwnd);
            LRESULT(0)
        }
        WM_PAINT => match with_context(|ctx| ctx.overlay.render(Instant::now())) {
            Some(frame) => {
                paint(hwnd, &frame);
                LRESULT(0)
            }
            None => DefWindowProcW(hwnd, msg, wparam, lparam),
        },
        // Background is filled in WM_PAINT
        WM_ERASEBKGND => LRESULT(1),
        WM_CLOSE => {
            close(hwnd);
            LRESULT(0)
        }
        WM_ENDSESSION if wparam.0 != 0 => {
            close(hwnd);
            LRESULT(0)
        }
        WM_DESTROY => {
            PostQuitMessage(0);
            LRESULT(0)
        }
        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}
