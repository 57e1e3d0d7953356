use std::time::Duration;

/// Timed transition between "rows matched" and "rows physically removed".
///
/// The animation runs on wall time; the director splices the rows out when
/// `advance` reports completion.
#[derive(PartialEq, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineClearAnimation {
    pub rows: Vec<usize>,
    elapsed: Duration,
    duration: Duration,
}

impl LineClearAnimation {
    pub fn new(rows: Vec<usize>, duration: Duration) -> Self {
        Self {
            rows,
            elapsed: Duration::ZERO,
            duration,
        }
    }

    /// Additional full rows matched while already animating join the set
    /// without resetting progress.
    pub fn merge_rows(&mut self, rows: &[usize]) {
        for &row in rows {
            if !self.rows.contains(&row) {
                self.rows.push(row);
            }
        }
    }

    /// Returns true once the animation has run its full duration.
    pub fn advance(&mut self, dt: Duration) -> bool {
        self.elapsed = (self.elapsed + dt).min(self.duration);
        self.elapsed >= self.duration
    }

    fn progress(&self) -> f32 {
        self.elapsed.as_secs_f32() / self.duration.as_secs_f32()
    }

    /// 1 for the first 30% of the duration, then linear decay to 0.
    pub fn outline_alpha(&self) -> f32 {
        let p = self.progress();
        if p <= 0.3 {
            1.0
        } else {
            (1.0 - (p - 0.3) / 0.7).max(0.0)
        }
    }

    /// 1 for the first 50% of the duration, then linear decay to 0.
    pub fn fade_alpha(&self) -> f32 {
        let p = self.progress();
        if p <= 0.5 {
            1.0
        } else {
            (1.0 - (p - 0.5) / 0.5).max(0.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anim() -> LineClearAnimation {
        LineClearAnimation::new(vec![19], Duration::from_millis(500))
    }

    #[test]
    fn alphas_start_saturated() {
        let a = anim();
        assert_eq!(a.outline_alpha(), 1.0);
        assert_eq!(a.fade_alpha(), 1.0);
    }

    #[test]
    fn alphas_decay_on_schedule() {
        let mut a = anim();
        // 40% through: outline decaying, fade still saturated.
        a.advance(Duration::from_millis(200));
        assert!(a.outline_alpha() < 1.0);
        assert_eq!(a.fade_alpha(), 1.0);
        // 80% through: both decaying.
        a.advance(Duration::from_millis(200));
        assert!(a.outline_alpha() < 0.5);
        assert!(a.fade_alpha() < 1.0);
    }

    #[test]
    fn completes_after_duration() {
        let mut a = anim();
        assert!(!a.advance(Duration::from_millis(499)));
        assert!(a.advance(Duration::from_millis(1)));
        assert_eq!(a.outline_alpha(), 0.0);
        assert_eq!(a.fade_alpha(), 0.0);
    }

    #[test]
    fn merge_deduplicates_rows() {
        let mut a = anim();
        a.merge_rows(&[19, 18]);
        assert_eq!(a.rows, vec![19, 18]);
    }
}
