//! Target-time planning: allocating effort to hit a goal finish time.
//!
//! Run with: cargo run --example target_time

use pace_planner::{
    plan_race, report, segments::Segment, AthleteProfile, PacingMode, PlanConfig, Terrain,
};

fn main() {
    let course = vec![
        Segment {
            from_label: "Start".into(),
            to_label: "CP1".into(),
            distance_km: 10.0,
            elevation_gain_m: 500.0,
            elevation_loss_m: 100.0,
            terrain: Terrain::RockyRunnable,
        },
        Segment {
            from_label: "CP1".into(),
            to_label: "CP2".into(),
            distance_km: 10.0,
            elevation_gain_m: 100.0,
            elevation_loss_m: 100.0,
            terrain: Terrain::SmoothTrail,
        },
        Segment {
            from_label: "CP2".into(),
            to_label: "Finish".into(),
            distance_km: 10.0,
            elevation_gain_m: 100.0,
            elevation_loss_m: 500.0,
            terrain: Terrain::RockyRunnable,
        },
    ];

    let athlete = AthleteProfile::default();
    let config = PlanConfig::default();

    // First find the natural time, then aim 25 minutes faster
    let natural = plan_race(&course, &athlete, PacingMode::BasePace, &config).unwrap();
    let target = natural.summary.total_time_min - 25.0;

    println!(
        "Natural time: {}   Target: {}\n",
        report::format_hms(natural.summary.total_time_min),
        report::format_hms(target)
    );

    let plan = plan_race(&course, &athlete, PacingMode::TargetTime(target), &config).unwrap();

    println!("{:<18} {:>8} {:>10} {:>9}", "Segment", "Pace", "Time", "Effort");
    for seg in &plan.segments {
        println!(
            "{:<18} {:>8} {:>10} {:>9}",
            format!("{} -> {}", seg.from_label, seg.to_label),
            report::format_pace(seg.pace_min_per_km),
            report::format_hms(seg.time_min),
            seg.effort_level,
        );
    }

    println!("\nPlanned total: {}", report::format_hms(plan.summary.total_time_min));
    if !plan.target_met {
        println!("Target exceeds this athlete's budget; plan shows the maximum feasible effort.");
    }

    if let Some(t) = plan.thresholds {
        println!("\nPacing envelope for this route:");
        println!("  Push below:    {}", report::format_hms(t.push_threshold_min));
        println!("  Natural:       {}", report::format_hms(t.natural_time_min));
        println!("  Protect above: {}", report::format_hms(t.protect_threshold_min));
    }
}
