// Parity stats engine: turns play-by-play game records into per-player stat
// lines, season leaderboards and salary estimates.
//
// The engine performs no I/O. Player lookup and creation go through the
// `repository::PlayerRepository` capability supplied by the caller.

pub mod aggregate;
pub mod calculator;
pub mod event;
pub mod league;
pub mod player;
pub mod processor;
pub mod repository;
pub mod salary;
pub mod stat_line;
