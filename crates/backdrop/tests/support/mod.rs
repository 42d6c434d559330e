#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::io::Cursor;

use backdrop::{Companion, MemoryResources, MemorySurface, SyncAgent};
use companion::{CompanionError, StatusCode, SyncState, Url};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

pub type MemoryAgent = SyncAgent<MemorySurface, MemoryResources>;

pub fn memory_agent() -> MemoryAgent {
    SyncAgent::new(MemorySurface::new(), MemoryResources::new())
}

pub fn png(shade: u8) -> Vec<u8> {
    let buffer = RgbaImage::from_pixel(2, 2, Rgba([shade, 0, 0, 255]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(buffer)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("encode png");
    bytes
}

/// In-process stand-in for the companion. Every image fetch returns a new,
/// distinguishable PNG unless `image_body` overrides it.
pub struct FakeCompanion {
    pub state: Cell<SyncState>,
    pub state_status: Cell<Option<u16>>,
    pub image_body: RefCell<Option<Vec<u8>>>,
    pub state_checks: Cell<usize>,
    pub image_fetches: Cell<usize>,
    pub served: RefCell<Vec<Vec<u8>>>,
}

impl FakeCompanion {
    pub fn new(state: SyncState) -> Self {
        Self {
            state: Cell::new(state),
            state_status: Cell::new(None),
            image_body: RefCell::new(None),
            state_checks: Cell::new(0),
            image_fetches: Cell::new(0),
            served: RefCell::new(Vec::new()),
        }
    }
}

fn status_error(path: &str, code: u16) -> CompanionError {
    CompanionError::Status {
        url: Url::parse("http://localhost:3040/").unwrap().join(path).unwrap(),
        status: StatusCode::from_u16(code).unwrap(),
    }
}

impl Companion for FakeCompanion {
    fn check_state(&self) -> Result<SyncState, CompanionError> {
        self.state_checks.set(self.state_checks.get() + 1);
        match self.state_status.get() {
            Some(code) => Err(status_error("state/", code)),
            None => Ok(self.state.get()),
        }
    }

    fn fetch_background(&self) -> Result<Vec<u8>, CompanionError> {
        let count = self.image_fetches.get() + 1;
        self.image_fetches.set(count);
        let body = self
            .image_body
            .borrow()
            .clone()
            .unwrap_or_else(|| png(count as u8));
        self.served.borrow_mut().push(body.clone());
        Ok(body)
    }
}
