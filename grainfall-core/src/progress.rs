//! Displays how many rounds a relaxation has already performed

use kdam::BarExt;

use grainfall_concepts::TimeError;

/// Counts rounds on the terminal
///
/// The total number of rounds is not known in advance.
/// Instead the bar shows the number of cells which still hold 4 or more grains.
pub struct RoundCounter {
    bar: Option<kdam::Bar>,
    count: usize,
}

impl RoundCounter {
    /// Creates a new counter which is only drawn if `show_progressbar` is set.
    pub fn new(show_progressbar: bool) -> Result<Self, TimeError> {
        let bar = match show_progressbar {
            true => Some(Self::initialize_bar()?),
            false => None,
        };
        Ok(Self { bar, count: 0 })
    }

    fn initialize_bar() -> Result<kdam::Bar, TimeError> {
        let bar_format = "\
        {desc}{count} rounds \
        [{elapsed}, \
        {rate:.2}{unit}/s{postfix}]";
        Ok(kdam::BarBuilder::default()
            .desc("Relaxing ")
            .unit(" rounds")
            .bar_format(bar_format)
            .dynamic_ncols(true)
            .build()?)
    }

    /// Advances the counter by one round.
    pub fn update(&mut self, n_unstable: usize) -> Result<(), std::io::Error> {
        self.count += 1;
        if let Some(bar) = self.bar.as_mut() {
            bar.set_postfix(format!(", unstable={}", n_unstable));
            let _ = bar.update(1)?;
        }
        Ok(())
    }

    /// Draws the final state and moves the cursor to the next line.
    pub fn finish(&mut self) -> Result<(), std::io::Error> {
        if let Some(bar) = self.bar.as_mut() {
            bar.refresh()?;
            eprintln!();
        }
        Ok(())
    }

    /// Rounds counted so far
    pub fn count(&self) -> usize {
        self.count
    }
}
