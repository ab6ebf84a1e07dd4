// Machine registry endpoints
//
// Snapshot listing, deletion and registration for `/api/machines`.

use tracing::debug;

use super::client::MachinesClient;
use crate::error::Error;
use crate::models::{Machine, MachineList, UpsertMachineRequest};

impl MachinesClient {
    /// List machines, optionally filtered by status (`"active"` / `"unreachable"`).
    ///
    /// `GET /api/machines[?status=...]`
    pub async fn list_machines(&self, status: Option<&str>) -> Result<MachineList, Error> {
        let mut url = self.api_url("machines")?;
        if let Some(status) = status {
            url.query_pairs_mut().append_pair("status", status);
        }
        let list: MachineList = self.get(url).await?;
        debug!(
            count = list.machines.len(),
            total = list.total,
            "fetched machine snapshot"
        );
        Ok(list)
    }

    /// Delete a machine by id.
    ///
    /// `DELETE /api/machines/{id}` -- expects 204 on success.
    pub async fn delete_machine(&self, id: i64) -> Result<(), Error> {
        let url = self.api_url(&format!("machines/{id}"))?;
        self.delete(url).await
    }

    /// Register or update a machine keyed by IP address.
    ///
    /// `PUT /api/machines/{ip_address}` -- 201 when created, 200 when updated.
    pub async fn upsert_machine(&self, request: &UpsertMachineRequest) -> Result<Machine, Error> {
        let url = self.api_url(&format!("machines/{}", request.ip_address))?;
        self.put(url, request).await
    }
}
