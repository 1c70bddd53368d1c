//! Melody detection: pick the melodic tracks, then reduce them to one voice
//!
//! Track selection follows the "best-k channel" approach: tracks are grouped
//! by the shape of their pitch-class histogram and the most melodic track of
//! each group is kept.

use std::collections::BTreeMap;

use crate::midi::{NoteSpan, TrackData};

/// Maximum number of track groups kept for melody extraction
const MAX_CLUSTERS: usize = 3;

/// Grid cells per beat used for quantizing note starts (a 32nd note)
const GRID_DIVISIONS_PER_BEAT: f64 = 8.0;

#[derive(Debug, Clone)]
pub struct TrackProfile {
    pub index: usize,
    pub avg_pitch: f64,
    pub note_count: usize,
    pub histogram: [f64; 12],
    pub melodic_score: f64,
}

impl TrackProfile {
    /// Profile a track, or `None` if it is empty or percussive
    pub fn from_track(track: &TrackData) -> Option<Self> {
        if track.note_ons.is_empty() || track.is_percussion {
            return None;
        }

        let notes = &track.note_ons;
        let count = notes.len() as f64;
        let avg_pitch = notes.iter().map(|&n| n as f64).sum::<f64>() / count;
        let max = notes.iter().copied().max().unwrap_or(0);
        let min = notes.iter().copied().min().unwrap_or(0);
        let pitch_range = (max - min) as f64;
        let note_density = count / (track.max_delta as f64 + 1.0);

        let mut histogram = [0.0; 12];
        for &note in notes {
            histogram[(note % 12) as usize] += 1.0;
        }
        let total: f64 = histogram.iter().sum();
        if total > 0.0 {
            histogram.iter_mut().for_each(|h| *h /= total);
        }

        // Higher, moderately wide, reasonably dense tracks score best
        let melodic_score = avg_pitch / 127.0 * 0.3
            + (pitch_range / 36.0).min(1.0) * 0.4
            + (note_density * 10.0).min(1.0) * 0.3;

        Some(TrackProfile {
            index: track.index,
            avg_pitch,
            note_count: notes.len(),
            histogram,
            melodic_score,
        })
    }
}

/// Indices of the tracks most likely to carry the melody
pub fn select_melody_tracks(tracks: &[TrackData]) -> Vec<usize> {
    let profiles: Vec<TrackProfile> = tracks.iter().filter_map(TrackProfile::from_track).collect();

    match profiles.len() {
        0 => return Vec::new(),
        1 => return vec![profiles[0].index],
        _ => {}
    }

    let k = MAX_CLUSTERS.min(profiles.len());
    let clusters = ward_clusters(&distance_rows(&profiles), k);

    let selected: Vec<usize> = clusters
        .iter()
        .filter_map(|members| {
            members
                .iter()
                .map(|&m| &profiles[m])
                // first track wins on equal scores
                .reduce(|best, p| if p.melodic_score > best.melodic_score { p } else { best })
                .map(|p| p.index)
        })
        .collect();

    tracing::info!(tracks = ?selected, "Selected melody tracks");
    selected
}

/// Pairwise L1 distances between the histograms, one row per track
///
/// Each row is the track's feature vector for clustering.
pub fn distance_rows(profiles: &[TrackProfile]) -> Vec<Vec<f64>> {
    profiles
        .iter()
        .map(|a| {
            profiles
                .iter()
                .map(|b| {
                    a.histogram
                        .iter()
                        .zip(b.histogram.iter())
                        .map(|(x, y)| (x - y).abs())
                        .sum()
                })
                .collect()
        })
        .collect()
}

/// Agglomerative clustering with Ward's criterion, stopping at `k` groups
///
/// Returns the member indices of each group, groups ordered by their lowest
/// member.
pub fn ward_clusters(points: &[Vec<f64>], k: usize) -> Vec<Vec<usize>> {
    struct Cluster {
        members: Vec<usize>,
        centroid: Vec<f64>,
    }

    let mut clusters: Vec<Cluster> = points
        .iter()
        .enumerate()
        .map(|(i, p)| Cluster {
            members: vec![i],
            centroid: p.clone(),
        })
        .collect();

    let k = k.max(1);
    while clusters.len() > k {
        let mut best: Option<(usize, usize, f64)> = None;
        for a in 0..clusters.len() {
            for b in (a + 1)..clusters.len() {
                let na = clusters[a].members.len() as f64;
                let nb = clusters[b].members.len() as f64;
                let dist2: f64 = clusters[a]
                    .centroid
                    .iter()
                    .zip(clusters[b].centroid.iter())
                    .map(|(x, y)| (x - y) * (x - y))
                    .sum();
                let cost = na * nb / (na + nb) * dist2;
                if best.map_or(true, |(_, _, c)| cost < c) {
                    best = Some((a, b, cost));
                }
            }
        }

        let Some((a, b, _)) = best else { break };
        let merged = clusters.remove(b);
        let target = &mut clusters[a];
        let na = target.members.len() as f64;
        let nb = merged.members.len() as f64;
        for (c, m) in target.centroid.iter_mut().zip(merged.centroid.iter()) {
            *c = (*c * na + m * nb) / (na + nb);
        }
        target.members.extend(merged.members);
        target.members.sort_unstable();
    }

    clusters.into_iter().map(|c| c.members).collect()
}

/// All notes of the selected tracks, sorted by start tick
pub fn collect_notes(tracks: &[TrackData], selected: &[usize]) -> Vec<NoteSpan> {
    let mut notes: Vec<NoteSpan> = selected
        .iter()
        .filter_map(|&index| tracks.iter().find(|t| t.index == index))
        .flat_map(|track| track.notes.iter().copied())
        .collect();
    notes.sort_by_key(|n| n.start);
    notes
}

/// Quantized note starts: grid cell -> notes starting there
pub struct TimeGrid {
    pub resolution: f64,
    pub cells: BTreeMap<i64, Vec<NoteSpan>>,
}

impl TimeGrid {
    pub fn new(notes: &[NoteSpan], ticks_per_beat: u32) -> Self {
        let resolution = ticks_per_beat as f64 / GRID_DIVISIONS_PER_BEAT;
        let mut cells: BTreeMap<i64, Vec<NoteSpan>> = BTreeMap::new();
        for note in notes {
            let cell = (note.start as f64 / resolution).round_ties_even() as i64;
            cells.entry(cell).or_default().push(*note);
        }
        TimeGrid { resolution, cells }
    }

    /// Reduce the grid to a single voice
    ///
    /// A cell that starts while the previous note still sounds only replaces
    /// it when its best note is clearly higher or louder.
    pub fn monophonic(&self) -> Vec<NoteSpan> {
        let mut melody: Vec<NoteSpan> = Vec::new();
        let mut last_note_end = 0.0;

        for (&cell, notes) in &self.cells {
            let Some(candidate) = most_salient(notes) else {
                continue;
            };
            let position = cell as f64 * self.resolution;

            if position < last_note_end {
                if let Some(current) = melody.last_mut() {
                    let higher = candidate.pitch as i32 > current.pitch as i32 + 3;
                    let louder = candidate.velocity as f64 > current.velocity as f64 * 1.2;
                    if higher || louder {
                        *current = candidate;
                        last_note_end = candidate.end as f64;
                    }
                }
            } else {
                melody.push(candidate);
                last_note_end = candidate.end as f64;
            }
        }

        melody
    }
}

/// Highest-and-loudest note of a cell; the first one wins ties
fn most_salient(notes: &[NoteSpan]) -> Option<NoteSpan> {
    let salience = |n: &NoteSpan| n.pitch as f64 * 0.7 + n.velocity as f64 * 0.3;
    notes
        .iter()
        .copied()
        .reduce(|best, n| if salience(&n) > salience(&best) { n } else { best })
}
