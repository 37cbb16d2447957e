mod enumerate;
mod sample;

pub use enumerate::Enumerate;
pub use sample::RandomRestart;

use crate::core::Solver;

/// Registry of the available solver backends.
#[allow(unsafe_code)]
#[linkme::distributed_slice]
pub static SOLVERS: [fn() -> Box<dyn Solver>] = [..];

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn registry_lists_backends() {
        let names: Vec<_> = SOLVERS.iter().map(|init| init().name().to_owned()).collect();
        assert!(names.iter().any(|name| name == "Enumerate"));
        assert!(names.iter().any(|name| name == "RandomRestart"));
    }
}
