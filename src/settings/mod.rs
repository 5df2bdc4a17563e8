use clap::Parser;
use glam::Vec3;
use itertools::Itertools;
use std::path::PathBuf;
use std::str::FromStr;

pub mod movement_settings;

#[derive(Parser, Debug)]
#[command(name = "charphys-sim")]
#[command(version)]
#[command(about = "Headless driver for the kinematic character movement core")]
pub struct CliArgs {
    /// The JSON file containing the Player* movement keys
    #[arg(long, env = "CHARPHYS_SETTINGS", default_value = "player_settings.json")]
    pub settings: PathBuf,

    /// Spawn position of the player. (0, 0, 0) means "use PlayerHeight from the settings".
    #[arg(long, value_parser = clap::value_parser!(Vector3), default_value = "(0, 0, 0)")]
    pub spawn: Vector3,

    /// Direction the player walks into every frame
    #[arg(long, value_parser = clap::value_parser!(Vector3), default_value = "(0, 0, 1)")]
    pub direction: Vector3,

    #[arg(long, default_value_t = 600)]
    pub frames: u32,

    #[arg(long, default_value_t = 1.0 / 60.0)]
    pub delta_time: f32,

    /// Jump on this frame
    #[arg(long)]
    pub jump_at: Option<u32>,

    /// Pretend the settings file changed on this frame
    #[arg(long)]
    pub reload_after: Option<u32>,
}

#[derive(Debug, Clone, Copy)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<Vector3> for Vec3 {
    fn from(value: Vector3) -> Self {
        Vec3::new(value.x, value.y, value.z)
    }
}

fn trim_brackets(input: &str) -> &str {
    let mut chars = input.chars();
    chars.next(); // skip first
    chars.next_back(); // skip last
    chars.as_str()
}

impl FromStr for Vector3 {
    type Err = String;

    // (-a, b, c)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let string: String = s.chars().filter(|&c| !c.is_whitespace()).collect();
        if !string.starts_with('(') || !string.ends_with(')') {
            return Err("Missing start or end bracket".to_string());
        }

        let trimmed_str = trim_brackets(string.as_str());
        let splits = trimmed_str.split(',').collect_vec();

        if splits.len() != 3 {
            return Err(format!(
                "Comma splitting resulted in {} splits, not 3!",
                splits.len()
            ));
        }

        let components = splits
            .iter()
            .map(|&split| {
                split
                    .parse::<f32>()
                    .map_err(|err| format!("Failed to parse component {}: {}", split, err))
            })
            .collect::<Result<Vec<f32>, String>>()?;

        Ok(Vector3 {
            x: components[0],
            y: components[1],
            z: components[2],
        })
    }
}
