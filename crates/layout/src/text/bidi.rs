use flowbox_style::Direction;
use flowbox_traits::{BidiRun, BidiSplitter};
use unicode_bidi::{BidiInfo, Level};

/// Directional runs from the Unicode Bidirectional Algorithm (UAX #9).
#[derive(Debug, Default, Clone, Copy)]
pub struct UnicodeBidiSplitter;

impl BidiSplitter for UnicodeBidiSplitter {
    fn split(&self, paragraph: &str, base: Direction) -> Vec<BidiRun> {
        if paragraph.is_empty() {
            return Vec::new();
        }
        let level = match base {
            Direction::Ltr => Level::ltr(),
            Direction::Rtl => Level::rtl(),
        };
        let info = BidiInfo::new(paragraph, Some(level));

        let mut runs: Vec<BidiRun> = Vec::new();
        for (pos, ch) in paragraph.char_indices() {
            let rtl = info.levels.get(pos).is_some_and(|l| l.is_rtl());
            let direction = if rtl { Direction::Rtl } else { Direction::Ltr };
            match runs.last_mut() {
                Some(run) if run.direction == direction => run.len += ch.len_utf8(),
                _ => runs.push(BidiRun::new(pos, ch.len_utf8(), direction)),
            }
        }
        runs
    }
}
