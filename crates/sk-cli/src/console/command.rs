//! Parsing console input lines into commands.

/// One console command. Combatants are addressed by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add {
        name: String,
        initiative: String,
        max_health: String,
        max_stamina: String,
        player: bool,
    },
    Roll {
        name: String,
        modifier: i32,
        player: bool,
    },
    Remove(String),
    Damage {
        target: String,
        amount: u32,
        attacker: Option<String>,
    },
    Heal {
        target: String,
        amount: u32,
    },
    Stamina {
        target: String,
        delta: i32,
    },
    SetHealth {
        target: String,
        health: u32,
    },
    Initiative {
        target: String,
        value: i32,
    },
    Revive(String),
    Start,
    Next,
    Reset,
    Clear,
    End,
    Dismiss,
    Status,
    Log {
        markdown: bool,
    },
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands:
  add <name> [init] [hp] [stamina] [--player]   add a combatant
  roll <name> [modifier] [--player]            add with a rolled d20 initiative
  remove <name>                                remove a combatant
  dmg <name> <amount> [by <attacker>]          deal damage
  heal <name> <amount>                         restore health
  stam <name> <+/-amount>                      change stamina
  hp <name> <value>                            set health directly
  init <name> <value>                          change initiative
  revive <name>                                bring a downed combatant back at 1 HP
  start | next | reset | clear                 run the fight
  end | dismiss                                show or hide the combat report
  log [md]                                     recent events, or the full log as markdown
  status | help | quit";

fn parse_number<T: std::str::FromStr>(value: Option<&str>, what: &str) -> Result<T, String> {
    let raw = value.ok_or_else(|| format!("missing {what}"))?;
    raw.parse()
        .map_err(|_| format!("{what} must be a number, got '{raw}'"))
}

fn name_arg(value: Option<&&str>, usage: &str) -> Result<String, String> {
    value
        .map(|s| s.to_string())
        .ok_or_else(|| format!("usage: {usage}"))
}

impl Command {
    /// Parse one input line.
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut words: Vec<&str> = line.split_whitespace().collect();
        let player = if let Some(pos) = words.iter().position(|w| *w == "--player") {
            words.remove(pos);
            true
        } else {
            false
        };
        let Some((cmd, args)) = words.split_first() else {
            return Err("empty command".to_string());
        };

        match cmd.to_lowercase().as_str() {
            "add" => Ok(Self::Add {
                name: name_arg(args.first(), "add <name> [init] [hp] [stamina]")?,
                initiative: args.get(1).unwrap_or(&"").to_string(),
                max_health: args.get(2).unwrap_or(&"").to_string(),
                max_stamina: args.get(3).unwrap_or(&"").to_string(),
                player,
            }),
            "roll" => Ok(Self::Roll {
                name: name_arg(args.first(), "roll <name> [modifier]")?,
                modifier: args
                    .get(1)
                    .copied()
                    .map(|raw| parse_number(Some(raw), "modifier"))
                    .transpose()?
                    .unwrap_or(0),
                player,
            }),
            "remove" | "rm" => Ok(Self::Remove(name_arg(args.first(), "remove <name>")?)),
            "dmg" | "damage" => {
                let attacker = match (args.get(2), args.get(3)) {
                    (Some(&"by"), Some(name)) => Some(name.to_string()),
                    (None, _) => None,
                    _ => return Err("usage: dmg <name> <amount> [by <attacker>]".to_string()),
                };
                Ok(Self::Damage {
                    target: name_arg(args.first(), "dmg <name> <amount>")?,
                    amount: parse_number(args.get(1).copied(), "amount")?,
                    attacker,
                })
            }
            "heal" => Ok(Self::Heal {
                target: name_arg(args.first(), "heal <name> <amount>")?,
                amount: parse_number(args.get(1).copied(), "amount")?,
            }),
            "stam" | "stamina" => Ok(Self::Stamina {
                target: name_arg(args.first(), "stam <name> <+/-amount>")?,
                delta: parse_number(args.get(1).map(|s| s.trim_start_matches('+')), "amount")?,
            }),
            "hp" => Ok(Self::SetHealth {
                target: name_arg(args.first(), "hp <name> <value>")?,
                health: parse_number(args.get(1).copied(), "health")?,
            }),
            "init" => Ok(Self::Initiative {
                target: name_arg(args.first(), "init <name> <value>")?,
                value: parse_number(args.get(1).copied(), "initiative")?,
            }),
            "revive" => Ok(Self::Revive(name_arg(args.first(), "revive <name>")?)),
            "start" => Ok(Self::Start),
            "next" | "n" => Ok(Self::Next),
            "reset" => Ok(Self::Reset),
            "clear" => Ok(Self::Clear),
            "end" => Ok(Self::End),
            "dismiss" => Ok(Self::Dismiss),
            "status" | "s" => Ok(Self::Status),
            "log" => match args.first() {
                None => Ok(Self::Log { markdown: false }),
                Some(&"md") => Ok(Self::Log { markdown: true }),
                Some(_) => Err("usage: log [md]".to_string()),
            },
            "help" | "?" => Ok(Self::Help),
            "quit" | "q" | "exit" => Ok(Self::Quit),
            other => Err(format!("unknown command: {other}")),
        }
    }
}
