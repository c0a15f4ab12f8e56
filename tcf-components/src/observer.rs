/// Receives progress from a forward run.
///
/// `on_step` is called once after each completed day with the number of days
/// completed so far and the total number of days in the run. Closures of the
/// form `|step, total| ...` implement this trait.
pub trait StepObserver {
    fn on_step(&mut self, step: usize, total: usize);
}

impl<F> StepObserver for F
where
    F: FnMut(usize, usize),
{
    fn on_step(&mut self, step: usize, total: usize) {
        self(step, total)
    }
}
