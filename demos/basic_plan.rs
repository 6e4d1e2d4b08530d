//! Basic example of planning a race at natural pace.
//!
//! Run with: cargo run --example basic_plan

use pace_planner::{
    plan_race, report, segments::Segment, AthleteProfile, PacingMode, PlanConfig, Terrain,
};

fn main() {
    // A 32 km mountain course with two checkpoints
    let course = vec![
        Segment {
            from_label: "Start".into(),
            to_label: "CP1".into(),
            distance_km: 11.0,
            elevation_gain_m: 850.0,
            elevation_loss_m: 120.0,
            terrain: Terrain::RockyRunnable,
        },
        Segment {
            from_label: "CP1".into(),
            to_label: "CP2".into(),
            distance_km: 12.5,
            elevation_gain_m: 300.0,
            elevation_loss_m: 350.0,
            terrain: Terrain::SmoothTrail,
        },
        Segment {
            from_label: "CP2".into(),
            to_label: "Finish".into(),
            distance_km: 8.5,
            elevation_gain_m: 100.0,
            elevation_loss_m: 780.0,
            terrain: Terrain::Technical,
        },
    ];

    let athlete = AthleteProfile::default();
    let config = PlanConfig {
        carbs_per_gel_g: Some(25.0),
        ..PlanConfig::default()
    };

    let plan = plan_race(&course, &athlete, PacingMode::BasePace, &config).unwrap();

    println!("Natural Pacing Plan\n");
    println!(
        "{:<18} {:>8} {:>10} {:>8} {:>10} {:>9} {:>8}",
        "Segment", "Dist", "Elev +/-", "Pace", "Time", "Carbs", "Water"
    );

    for seg in &plan.segments {
        println!(
            "{:<18} {:>6.1}km {:>4.0}/{:<4.0} {:>8} {:>10} {:>7.0}g {:>6.1}L",
            format!("{} -> {}", seg.from_label, seg.to_label),
            seg.distance_km,
            seg.elevation_gain_m,
            seg.elevation_loss_m,
            report::format_pace(seg.pace_min_per_km),
            report::format_hms(seg.time_min),
            seg.carbs_g,
            seg.water_l,
        );
    }

    println!("\nTotals:");
    println!("  Distance:    {:.1} km", plan.summary.total_distance_km);
    println!("  Climbing:    +{:.0}m / -{:.0}m", plan.summary.total_gain_m, plan.summary.total_loss_m);
    println!("  Moving time: {}", report::format_hms(plan.summary.moving_time_min));
    println!("  Total time:  {}", report::format_hms(plan.summary.total_time_min));
    println!("  Avg pace:    {} min/km", report::format_pace(plan.summary.average_pace_min_per_km));
    println!("  Nutrition:   {:.0} g carbs, {:.1} L water", plan.summary.total_carbs_g, plan.summary.total_water_l);
}
