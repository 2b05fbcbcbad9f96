/// Columns of the bounty ledger, in sheet order (A..N).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedgerColumn {
    Id,
    Phase,
    TaskName,
    FullDescription,
    IssueUrl,
    Deliverables,
    Dependencies,
    EstimatedHours,
    Bounty,
    Status,
    Notes,
    TransactionId,
    StartHour,
    EndHour,
}

impl LedgerColumn {
    pub const ALL: [LedgerColumn; 14] = [
        LedgerColumn::Id,
        LedgerColumn::Phase,
        LedgerColumn::TaskName,
        LedgerColumn::FullDescription,
        LedgerColumn::IssueUrl,
        LedgerColumn::Deliverables,
        LedgerColumn::Dependencies,
        LedgerColumn::EstimatedHours,
        LedgerColumn::Bounty,
        LedgerColumn::Status,
        LedgerColumn::Notes,
        LedgerColumn::TransactionId,
        LedgerColumn::StartHour,
        LedgerColumn::EndHour,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub fn header(self) -> &'static str {
        match self {
            LedgerColumn::Id => "ID",
            LedgerColumn::Phase => "Phase",
            LedgerColumn::TaskName => "Task Name",
            LedgerColumn::FullDescription => "Full Description",
            LedgerColumn::IssueUrl => "Issue URL",
            LedgerColumn::Deliverables => "Deliverables",
            LedgerColumn::Dependencies => "Dependencies",
            LedgerColumn::EstimatedHours => "Estimated Hours",
            LedgerColumn::Bounty => "Bounty",
            LedgerColumn::Status => "Status",
            LedgerColumn::Notes => "Notes",
            LedgerColumn::TransactionId => "Transaction ID",
            LedgerColumn::StartHour => "Start Hour",
            LedgerColumn::EndHour => "End Hour",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Spreadsheet column letter (A for the first column).
    pub fn letter(self) -> char {
        (b'A' + self as u8) as char
    }
}

/// One row of the ledger. Always holds exactly [`LedgerColumn::COUNT`] cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerRow {
    cells: [String; LedgerColumn::COUNT],
}

impl Default for LedgerRow {
    fn default() -> Self {
        Self {
            cells: std::array::from_fn(|_| String::new()),
        }
    }
}

impl LedgerRow {
    pub fn get(&self, column: LedgerColumn) -> &str {
        &self.cells[column.index()]
    }

    pub fn set(&mut self, column: LedgerColumn, value: impl Into<String>) {
        self.cells[column.index()] = value.into();
    }

    /// The value matched against the first sheet column on upsert.
    pub fn id(&self) -> &str {
        self.get(LedgerColumn::Id)
    }

    pub fn cells(&self) -> &[String] {
        &self.cells
    }

    pub fn headers() -> Vec<&'static str> {
        LedgerColumn::ALL.iter().map(|c| c.header()).collect()
    }

    /// A1 range covering this row's cells at 1-based sheet row `row`.
    pub fn range_for(row: usize) -> String {
        let first = LedgerColumn::ALL[0].letter();
        let last = LedgerColumn::ALL[LedgerColumn::COUNT - 1].letter();
        format!("{first}{row}:{last}{row}")
    }
}
