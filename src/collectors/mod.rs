//! Collectors for host readings that are not derived from /proc/stat or
//! /proc/meminfo: filesystem usage, network throughput and thermal sensors.

pub mod filesystem;
pub mod netdev;
pub mod thermal;
