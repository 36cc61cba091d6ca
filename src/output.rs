//! # Output Sinks
//!
//! Writing a finished frame is the last step of a tick. The engine only knows
//! the [`OutputSink`] trait; what sits behind it depends on the target:
//!
//! - [`CanvasSink`]: any embedded-graphics `DrawTarget<Color = Rgb888>`, one
//!   filled square per LED at its layout position (preview windows, small
//!   TFT panels, `MockDisplay` in tests)
//! - [`LedStripSink`]: a smart-leds driver; each `write` is a full `show()`
//! - [`TerminalSink`]: ANSI truecolor blocks for development without hardware
//!
//! Sinks never read back what they wrote, and the frame slice is in chain
//! order (index 0 is the first LED on the data line).

use std::io::{self, Write};

use embedded_graphics::{
    pixelcolor::Rgb888,
    prelude::{DrawTarget, Point, Primitive, Size},
    primitives::{PrimitiveStyle, Rectangle},
    Drawable,
};
use smart_leds::SmartLedsWrite;

use crate::{color::Rgb, topology::TopologyMapper};

/// Destination for rendered frames.
pub trait OutputSink {
    type Error;

    /// Present one frame. `mapper` describes where each LED sits.
    fn write(&mut self, frame: &[Rgb], mapper: &TopologyMapper) -> Result<(), Self::Error>;
}

/// Draws LEDs as squares on a 2-D drawing surface.
pub struct CanvasSink<D> {
    display: D,
    cell: u32,
    origin: Point,
}

impl<D> CanvasSink<D>
where
    D: DrawTarget<Color = Rgb888>,
{
    /// `cell` is the side of one LED square in display pixels.
    pub fn new(display: D, cell: u32) -> Self {
        Self {
            display,
            cell: cell.max(1),
            origin: Point::zero(),
        }
    }

    pub fn with_origin(mut self, origin: Point) -> Self {
        self.origin = origin;
        self
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn into_inner(self) -> D {
        self.display
    }
}

impl<D> OutputSink for CanvasSink<D>
where
    D: DrawTarget<Color = Rgb888>,
{
    type Error = D::Error;

    fn write(&mut self, frame: &[Rgb], mapper: &TopologyMapper) -> Result<(), Self::Error> {
        let cell = self.cell as f32;
        for (index, px) in frame.iter().enumerate() {
            let at = mapper.locate(index);
            let top_left =
                self.origin + Point::new((at.x * cell).round() as i32, (at.y * cell).round() as i32);
            Rectangle::new(top_left, Size::new_equal(self.cell))
                .into_styled(PrimitiveStyle::with_fill(Rgb888::new(px.r, px.g, px.b)))
                .draw(&mut self.display)?;
        }
        Ok(())
    }
}

/// Pushes frames to an addressable LED driver.
pub struct LedStripSink<W> {
    driver: W,
}

impl<W> LedStripSink<W>
where
    W: SmartLedsWrite<Color = Rgb>,
{
    pub fn new(driver: W) -> Self {
        Self { driver }
    }

    pub fn driver(&self) -> &W {
        &self.driver
    }
}

impl<W> OutputSink for LedStripSink<W>
where
    W: SmartLedsWrite<Color = Rgb>,
{
    type Error = W::Error;

    // Chain order is the frame order, so the layout is irrelevant here
    fn write(&mut self, frame: &[Rgb], _mapper: &TopologyMapper) -> Result<(), Self::Error> {
        self.driver.write(frame.iter().copied())
    }
}

/// Prints frames as truecolor blocks, laid out like the physical LEDs.
pub struct TerminalSink<W> {
    out: W,
}

impl<W: io::Write> TerminalSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl TerminalSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: io::Write> OutputSink for TerminalSink<W> {
    type Error = io::Error;

    fn write(&mut self, frame: &[Rgb], mapper: &TopologyMapper) -> Result<(), Self::Error> {
        let (width, height) = mapper.extent();
        let cols = width.round() as usize + 1;
        let rows = height.round() as usize + 1;

        let mut grid: Vec<Option<Rgb>> = vec![None; cols * rows];
        for (index, px) in frame.iter().enumerate() {
            let at = mapper.locate(index);
            let col = (at.x.round() as usize).min(cols - 1);
            let row = (at.y.round() as usize).min(rows - 1);
            grid[row * cols + col] = Some(*px);
        }

        for line in grid.chunks(cols) {
            for cell in line {
                match cell {
                    Some(px) => write!(self.out, "\x1b[48;2;{};{};{}m  ", px.r, px.g, px.b)?,
                    None => write!(self.out, "\x1b[0m  ")?,
                }
            }
            writeln!(self.out, "\x1b[0m")?;
        }
        self.out.flush()
    }
}
